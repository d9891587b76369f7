//! Variable resolution — an ordered left fold over the namespace.
//!
//! Stages: built-ins from configuration, collected parameter values, script
//! variables, then inline custom variables in declaration order. Each stage
//! merges over the accumulated namespace before the next runs, so later
//! stages override earlier ones and an expression only ever sees values
//! produced before it.

use templar_core::config::Config;
use templar_core::types::VariableKind;
use templar_lang::eval::Scope;
use templar_lang::{compile, eval, parse_expression, Namespace, Value};

use crate::context::ExecContext;
use crate::error::EngineError;
use crate::validate::LoadedTemplate;

/// Resolve the full namespace for one render.
pub fn resolve_variables(
    loaded: &LoadedTemplate,
    collected: &Namespace,
    exec: &ExecContext,
    config: &Config,
) -> Result<Namespace, EngineError> {
    let context = exec.to_value();

    let mut namespace = builtins(config);
    namespace = namespace.merged(collected.clone());
    namespace = apply_script(loaded, namespace, &context)?;
    apply_inline(loaded, namespace, &context)
}

// ---------------------------------------------------------------------------
// Stage 1: built-ins
// ---------------------------------------------------------------------------

/// `author`, `organization`, and `date` from process configuration.
fn builtins(config: &Config) -> Namespace {
    let author = Value::Map(
        [
            ("firstName".to_string(), Value::string(config.author.first_name.clone())),
            ("lastName".to_string(), Value::string(config.author.last_name.clone())),
            ("email".to_string(), Value::string(config.author.email.clone())),
            ("fullName".to_string(), Value::string(config.author.full_name())),
        ]
        .into(),
    );
    let organization = Value::Map(
        [("name".to_string(), Value::string(config.organization.name.clone()))].into(),
    );

    Namespace::new()
        .with("author", author)
        .with("organization", organization)
        // Computed once so every file of the render sees the same instant.
        .with("date", Value::string(chrono::Utc::now().to_rfc3339()))
}

// ---------------------------------------------------------------------------
// Stage 3: script variables
// ---------------------------------------------------------------------------

fn apply_script(
    loaded: &LoadedTemplate,
    namespace: Namespace,
    context: &Value,
) -> Result<Namespace, EngineError> {
    let Some(function) = &loaded.variables_fn else {
        return Ok(namespace);
    };

    let result = function
        .call(&[namespace.to_value(), context.clone()])
        .map_err(|source| EngineError::Eval {
            what: format!("variables function '{}'", function.name()),
            source,
        })?;

    let map = match result {
        Value::Map(map) => map,
        other => return Err(EngineError::ScriptNotAMap { kind: other.kind() }),
    };

    let mut namespace = namespace;
    for (key, value) in map {
        if value.is_undefined() {
            return Err(EngineError::UndefinedVariable { name: key });
        }
        namespace = namespace.with(key, value);
    }
    Ok(namespace)
}

// ---------------------------------------------------------------------------
// Stage 4: inline custom variables
// ---------------------------------------------------------------------------

fn apply_inline(
    loaded: &LoadedTemplate,
    mut namespace: Namespace,
    context: &Value,
) -> Result<Namespace, EngineError> {
    for var in &loaded.template.variables {
        let value = match var.kind {
            VariableKind::DotJs => {
                let compiled = compile(&var.value).map_err(|source| EngineError::Compile {
                    what: format!("variable '{}'", var.name),
                    source,
                })?;
                let text = compiled
                    .render(&namespace.to_value())
                    .map_err(|source| EngineError::Eval {
                        what: format!("variable '{}'", var.name),
                        source,
                    })?;
                Value::Str(text)
            }
            VariableKind::Js => {
                let expr = parse_expression(&var.value).map_err(|source| EngineError::Compile {
                    what: format!("variable '{}'", var.name),
                    source,
                })?;
                let scope = Scope::with_bindings([
                    ("data".to_string(), namespace.to_value()),
                    ("context".to_string(), context.clone()),
                ]);
                eval(&expr, &scope).map_err(|source| EngineError::Eval {
                    what: format!("variable '{}'", var.name),
                    source,
                })?
            }
        };
        if value.is_undefined() {
            return Err(EngineError::UndefinedVariable { name: var.name.clone() });
        }
        // Merge immediately: later variables see this one, earlier ones
        // never did.
        namespace = namespace.with(var.name.clone(), value);
    }
    Ok(namespace)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
