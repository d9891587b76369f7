//! Subcommand implementations.

pub mod author;
pub mod check;
pub mod list;
pub mod new;

use std::path::PathBuf;

use anyhow::{Context, Result};

use templar_core::config::Config;
use templar_core::diagnostics::Diagnostics;
use templar_engine::{discover_templates, LoadedTemplate};

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Load config and scan every configured repository.
pub fn discover(config: &Config) -> (Vec<LoadedTemplate>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let templates = discover_templates(&config.repositories, &mut diagnostics);
    (templates, diagnostics)
}
