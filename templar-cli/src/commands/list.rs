//! `templar list` — table of discovered templates.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templar_core::config::load_config_at;
use templar_core::diagnostics::Diagnostic;
use templar_engine::LoadedTemplate;

/// Arguments for `templar list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "category")]
    category: String,
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "description")]
    description: String,
}

#[derive(Serialize)]
struct ListJson {
    templates: Vec<TemplateJson>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct TemplateJson {
    name: String,
    category: String,
    repository: String,
    files: usize,
    description: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let config = load_config_at(&home).context("failed to load configuration")?;
        let (mut templates, diagnostics) = super::discover(&config);
        templates.sort_by(|a, b| {
            (a.template.category_or_default(), &a.template.name.0)
                .cmp(&(b.template.category_or_default(), &b.template.name.0))
        });

        if self.json {
            let payload = ListJson {
                templates: templates.iter().map(template_json).collect(),
                diagnostics: diagnostics.entries().to_vec(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize list JSON")?
            );
            return Ok(());
        }

        if templates.is_empty() {
            println!("No templates discovered.");
        } else {
            let rows: Vec<TemplateRow> = templates
                .iter()
                .map(|t| TemplateRow {
                    name: t.template.name.to_string(),
                    category: t.template.category_or_default().to_string(),
                    repository: t.template.repository_name.clone().unwrap_or_default(),
                    files: t.template.files.len(),
                    description: t.template.description.clone(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }

        if !diagnostics.is_empty() {
            let summary = format!(
                "{} diagnostic(s) — run 'templar check' for details",
                diagnostics.len()
            );
            if diagnostics.has_errors() {
                println!("{}", summary.red());
            } else {
                println!("{}", summary.yellow());
            }
        }
        Ok(())
    }
}

fn template_json(t: &LoadedTemplate) -> TemplateJson {
    TemplateJson {
        name: t.template.name.to_string(),
        category: t.template.category_or_default().to_string(),
        repository: t.template.repository_name.clone().unwrap_or_default(),
        files: t.template.files.len(),
        description: t.template.description.clone(),
    }
}
