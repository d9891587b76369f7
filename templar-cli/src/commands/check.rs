//! `templar check` — validate repositories, report diagnostics.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templar_core::config::load_config_at;
use templar_core::diagnostics::{Diagnostic, DiagnosticLevel};

/// Arguments for `templar check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "level")]
    level: String,
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "message")]
    message: String,
}

#[derive(Serialize)]
struct CheckJson {
    templates: usize,
    diagnostics: Vec<Diagnostic>,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let config = load_config_at(&home).context("failed to load configuration")?;
        let (templates, diagnostics) = super::discover(&config);

        if self.json {
            let payload = CheckJson {
                templates: templates.len(),
                diagnostics: diagnostics.entries().to_vec(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize check JSON")?
            );
        } else {
            println!(
                "{} repositor(ies), {} valid template(s)",
                config.repositories.len(),
                templates.len()
            );
            if diagnostics.is_empty() {
                println!("{}", "✓ no problems found".green());
            } else {
                let rows: Vec<DiagnosticRow> = diagnostics
                    .entries()
                    .iter()
                    .map(|d| DiagnosticRow {
                        level: level_label(d.level),
                        repository: d.repository_id.to_string(),
                        message: d.message.clone(),
                    })
                    .collect();
                let mut table = Table::new(rows);
                table.with(Style::rounded());
                println!("{table}");
            }
        }

        let errors = diagnostics
            .entries()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count();
        if errors > 0 {
            bail!("{errors} error-level diagnostic(s)");
        }
        Ok(())
    }
}

fn level_label(level: DiagnosticLevel) -> String {
    match level {
        DiagnosticLevel::Info => "info".bright_black().to_string(),
        DiagnosticLevel::Warning => "warning".yellow().to_string(),
        DiagnosticLevel::Error => "error".red().bold().to_string(),
    }
}
