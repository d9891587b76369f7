//! `templar new` — pick a template, collect parameters, render files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use templar_core::config::load_config_at;
use templar_core::diagnostics::{DiagnosticLevel, Diagnostics};
use templar_core::types::TemplateParameter;
use templar_engine::{
    collect_parameters, materialize, resolve_variables, Collected, ExecContext, LoadedTemplate,
    Prompter, Reply,
};

/// Arguments for `templar new`.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Template name; opens a picker when omitted.
    pub name: Option<String>,

    /// Only consider templates from this repository id.
    #[arg(long)]
    pub repo: Option<String>,

    /// Directory to render into (defaults to the current directory).
    #[arg(long)]
    pub target: Option<PathBuf>,
}

impl NewArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let config = load_config_at(&home).context("failed to load configuration")?;
        if config.repositories.is_empty() {
            bail!("no template repositories configured; add one to ~/.templar/config.yaml");
        }

        let (mut templates, diagnostics) = super::discover(&config);
        report_problems(&diagnostics);
        if let Some(repo) = &self.repo {
            templates.retain(|t| {
                t.template
                    .repository_id
                    .as_ref()
                    .is_some_and(|id| id.0 == *repo)
            });
        }
        if templates.is_empty() {
            bail!("no templates available; run 'templar check' for details");
        }

        let selected = match &self.name {
            Some(name) => {
                let found = templates
                    .into_iter()
                    .find(|t| t.template.name.0 == *name)
                    .with_context(|| format!("no template named '{name}'"))?;
                Some(found)
            }
            None => pick_template(templates)?,
        };
        let Some(loaded) = selected else {
            println!("{}", "cancelled — no files written".yellow());
            return Ok(());
        };

        let target = match self.target {
            Some(dir) => dir,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        let template_dir = loaded
            .template
            .directory
            .clone()
            .context("template is missing its repository directory")?;
        let exec = ExecContext::new(&target, &target, &template_dir);

        let mut prompter = DialoguerPrompter::default();
        let collected = match collect_parameters(&loaded.template, &exec, &mut prompter)? {
            Collected::Values(values) => values,
            Collected::Cancelled => {
                println!("{}", "cancelled — no files written".yellow());
                return Ok(());
            }
        };

        let namespace = resolve_variables(&loaded, &collected, &exec, &config)
            .with_context(|| format!("failed to resolve variables for '{}'", loaded.template.name))?;
        let written = materialize(&loaded.template, &target, &namespace)
            .with_context(|| format!("failed to render '{}'", loaded.template.name))?;

        println!(
            "{} {} — {} file(s) created",
            "✓".green().bold(),
            loaded.template.name.to_string().bold(),
            written.len()
        );
        for path in &written {
            println!("  {}", path.display());
        }
        Ok(())
    }
}

fn report_problems(diagnostics: &Diagnostics) {
    for d in diagnostics.entries() {
        if d.level >= DiagnosticLevel::Warning {
            eprintln!("{} [{}] {}", d.level.to_string().yellow(), d.repository_id, d.message);
        }
    }
}

/// Interactive picker, grouped by category. `None` means the user backed out.
fn pick_template(mut templates: Vec<LoadedTemplate>) -> Result<Option<LoadedTemplate>> {
    templates.sort_by(|a, b| {
        (a.template.category_or_default(), &a.template.name.0)
            .cmp(&(b.template.category_or_default(), &b.template.name.0))
    });
    let labels: Vec<String> = templates
        .iter()
        .map(|t| {
            let repo = t.template.repository_name.as_deref().unwrap_or("?");
            format!(
                "[{}] {} — {} ({repo})",
                t.template.category_or_default(),
                t.template.name,
                t.template.description,
            )
        })
        .collect();

    let chosen = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Template")
        .items(&labels)
        .default(0)
        .interact_opt()
        .context("template picker failed")?;
    Ok(chosen.map(|i| templates.swap_remove(i)))
}

// ---------------------------------------------------------------------------
// Dialoguer-backed prompter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl Prompter for DialoguerPrompter {
    fn input(&mut self, param: &TemplateParameter, error: Option<&str>) -> Reply<String> {
        if let Some(message) = error {
            eprintln!("{}", message.red());
        }
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(&param.display_name)
            .allow_empty(true);
        if let Some(serde_json::Value::String(default)) = &param.default {
            input = input.default(default.clone());
        }
        match input.interact_text() {
            Ok(text) => Reply::Value(text),
            Err(_) => Reply::Cancelled,
        }
    }

    fn confirm(&mut self, param: &TemplateParameter, default: bool) -> Reply<bool> {
        match Confirm::with_theme(&self.theme)
            .with_prompt(&param.display_name)
            .default(default)
            .interact_opt()
        {
            Ok(Some(flag)) => Reply::Value(flag),
            Ok(None) => Reply::Dismissed,
            Err(_) => Reply::Cancelled,
        }
    }

    fn select(&mut self, param: &TemplateParameter, default: usize) -> Reply<usize> {
        let labels: Vec<&str> = param.options.iter().map(|o| o.label.as_str()).collect();
        match Select::with_theme(&self.theme)
            .with_prompt(&param.display_name)
            .items(&labels)
            .default(default)
            .interact_opt()
        {
            Ok(Some(index)) => Reply::Value(index),
            Ok(None) => Reply::Dismissed,
            Err(_) => Reply::Cancelled,
        }
    }

    fn multi_select(&mut self, param: &TemplateParameter, defaults: &[bool]) -> Reply<Vec<bool>> {
        let labels: Vec<&str> = param.options.iter().map(|o| o.label.as_str()).collect();
        match MultiSelect::with_theme(&self.theme)
            .with_prompt(&param.display_name)
            .items(&labels)
            .defaults(defaults)
            .interact_opt()
        {
            Ok(Some(picked)) => {
                let mut flags = vec![false; param.options.len()];
                for index in picked {
                    if let Some(flag) = flags.get_mut(index) {
                        *flag = true;
                    }
                }
                Reply::Value(flags)
            }
            Ok(None) => Reply::Dismissed,
            Err(_) => Reply::Cancelled,
        }
    }
}
