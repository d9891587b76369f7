//! File materialization — destinations first, then writes in strict order.
//!
//! Every destination pattern is rendered before any file touches disk, so a
//! blank path aborts the whole template with zero writes. The writes
//! themselves are best-effort and non-transactional: a failure at file K
//! leaves files 1..K-1 in place and reports the error.

use std::path::{Path, PathBuf};

use templar_core::types::Template;
use templar_lang::{compile, Namespace, Value};

use crate::error::{io_err, EngineError};

/// Render and write every file of `template` under `target_dir`.
///
/// Returns the paths written, in declaration order.
pub fn materialize(
    template: &Template,
    target_dir: &Path,
    namespace: &Namespace,
) -> Result<Vec<PathBuf>, EngineError> {
    let repo_root = template
        .directory
        .as_deref()
        .ok_or_else(|| EngineError::Detached { name: template.name.to_string() })?;
    let data = namespace.to_value();

    let destinations = render_destinations(template, target_dir, &data)?;

    let mut written = Vec::with_capacity(destinations.len());
    for (file, dest) in template.files.iter().zip(destinations) {
        let source = repo_root.join(&file.source);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        if file.process {
            let raw = std::fs::read_to_string(&source).map_err(|e| io_err(&source, e))?;
            let content = render_content(&file.source, &raw, &data)?;
            std::fs::write(&dest, content).map_err(|e| io_err(&dest, e))?;
        } else {
            std::fs::copy(&source, &dest).map_err(|e| io_err(&source, e))?;
        }
        tracing::info!("wrote: {}", dest.display());
        written.push(dest);
    }
    Ok(written)
}

/// Render every destination pattern up front, rejecting blank results.
fn render_destinations(
    template: &Template,
    target_dir: &Path,
    data: &Value,
) -> Result<Vec<PathBuf>, EngineError> {
    let mut destinations = Vec::with_capacity(template.files.len());
    for file in &template.files {
        let compiled = compile(&file.destination).map_err(|source| EngineError::Compile {
            what: format!("destination pattern {:?}", file.destination),
            source,
        })?;
        let rendered = compiled.render(data).map_err(|source| EngineError::Eval {
            what: format!("destination pattern {:?}", file.destination),
            source,
        })?;
        if rendered.trim().is_empty() {
            return Err(EngineError::PathEmpty { pattern: file.destination.clone() });
        }
        destinations.push(target_dir.join(rendered.trim()));
    }
    Ok(destinations)
}

fn render_content(source_name: &str, raw: &str, data: &Value) -> Result<String, EngineError> {
    let compiled = compile(raw).map_err(|source| EngineError::Compile {
        what: format!("content of {source_name}"),
        source,
    })?;
    compiled.render(data).map_err(|source| EngineError::Eval {
        what: format!("content of {source_name}"),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
