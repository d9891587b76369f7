//! `templar author` — interactive author/organization configuration.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use templar_core::config::{config_path_at, load_config_at, save_config_at};

/// Arguments for `templar author`.
#[derive(Args, Debug)]
pub struct AuthorArgs {}

impl AuthorArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let mut config = load_config_at(&home).context("failed to load configuration")?;
        let theme = ColorfulTheme::default();

        config.author.first_name = ask(&theme, "First name", &config.author.first_name)?;
        config.author.last_name = ask(&theme, "Last name", &config.author.last_name)?;
        config.author.email = ask(&theme, "Email", &config.author.email)?;
        config.organization.name = ask(&theme, "Organization", &config.organization.name)?;

        save_config_at(&home, &config).context("failed to save configuration")?;
        println!(
            "{} saved to {}",
            "✓".green().bold(),
            config_path_at(&home).display()
        );
        Ok(())
    }
}

fn ask(theme: &ColorfulTheme, prompt: &str, current: &str) -> Result<String> {
    Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()
        .context("prompt aborted")
}
