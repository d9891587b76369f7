//! Templar — file scaffolding from template repositories.
//!
//! # Usage
//!
//! ```text
//! templar new [NAME] [--repo <id>] [--target <dir>]
//! templar list [--json]
//! templar check [--json]
//! templar author
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{author::AuthorArgs, check::CheckArgs, list::ListArgs, new::NewArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templar",
    version,
    about = "Scaffold files from parameterized template repositories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template into a target directory.
    New(NewArgs),

    /// List discovered templates across configured repositories.
    List(ListArgs),

    /// Validate repositories and print the diagnostics report.
    Check(CheckArgs),

    /// Configure the author info used by built-in template variables.
    Author(AuthorArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::New(args) => args.run(),
        Commands::List(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Author(args) => args.run(),
    }
}
