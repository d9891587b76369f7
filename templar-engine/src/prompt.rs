//! Parameter collection — strict declaration order, forward-only visibility.
//!
//! The engine owns the collection logic; the UI is supplied by the caller
//! through [`Prompter`]. The CLI wires dialoguer in; tests use a scripted
//! prompter.

use templar_core::types::{ParameterKind, Template, TemplateParameter};
use templar_lang::eval::Scope;
use templar_lang::{eval, parse_expression, Namespace, Value};

use crate::context::ExecContext;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Prompter trait
// ---------------------------------------------------------------------------

/// Outcome of a single prompt interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Value(T),
    /// The prompt was closed without an answer (Esc on a picker).
    Dismissed,
    /// The user aborted the whole run (Ctrl-C).
    Cancelled,
}

/// UI seam for parameter collection.
pub trait Prompter {
    /// Free-text input. `error` carries the rejection message when re-asking
    /// after a failed required/pattern check.
    fn input(&mut self, param: &TemplateParameter, error: Option<&str>) -> Reply<String>;

    /// Yes/no toggle with a preselected default.
    fn confirm(&mut self, param: &TemplateParameter, default: bool) -> Reply<bool>;

    /// Single choice; returns the index into `param.options`.
    fn select(&mut self, param: &TemplateParameter, default: usize) -> Reply<usize>;

    /// Multiple choice; one flag per option, preselected from `defaults`.
    fn multi_select(&mut self, param: &TemplateParameter, defaults: &[bool]) -> Reply<Vec<bool>>;
}

/// Result of collecting every parameter of a template.
///
/// Cancellation is a value, not an error: the caller stops cleanly with zero
/// file writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    Values(Namespace),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Collect all parameters of `template` in declaration order.
///
/// Each resolved value is merged into the namespace before the next
/// parameter's `visibleIf` runs, so conditions see earlier answers and only
/// earlier answers. Hidden parameters bind their declared default without
/// any interaction.
pub fn collect_parameters(
    template: &Template,
    exec: &ExecContext,
    prompter: &mut dyn Prompter,
) -> Result<Collected, EngineError> {
    let context = exec.to_value();
    let mut namespace = Namespace::new();

    for param in &template.parameters {
        if !is_visible(param, &namespace, &context)? {
            namespace = namespace.with(param.name.clone(), hidden_default(param));
            continue;
        }
        let value = match param.kind {
            ParameterKind::String => prompt_string(param, prompter)?,
            ParameterKind::Boolean => prompt_boolean(param, prompter),
            ParameterKind::Selection => prompt_selection(param, prompter),
            ParameterKind::SelectionMany => prompt_selection_many(param, prompter),
        };
        match value {
            Some(value) => namespace = namespace.with(param.name.clone(), value),
            None => return Ok(Collected::Cancelled),
        }
    }
    Ok(Collected::Values(namespace))
}

fn is_visible(
    param: &TemplateParameter,
    namespace: &Namespace,
    context: &Value,
) -> Result<bool, EngineError> {
    let Some(source) = &param.visible_if else {
        return Ok(true);
    };
    let expr = parse_expression(source).map_err(|source| EngineError::Compile {
        what: format!("visibleIf of parameter '{}'", param.name),
        source,
    })?;
    let scope = Scope::with_bindings([
        ("data".to_string(), namespace.to_value()),
        ("context".to_string(), context.clone()),
    ]);
    let value = eval(&expr, &scope).map_err(|source| EngineError::Eval {
        what: format!("visibleIf of parameter '{}'", param.name),
        source,
    })?;
    Ok(value.is_truthy())
}

// ---------------------------------------------------------------------------
// Per-kind prompting
// ---------------------------------------------------------------------------

/// `Some(value)` on success, `None` to cancel the whole collection.
fn prompt_string(
    param: &TemplateParameter,
    prompter: &mut dyn Prompter,
) -> Result<Option<Value>, EngineError> {
    let pattern = param
        .pattern
        .as_ref()
        .map(|p| regex::Regex::new(p))
        .transpose()
        .map_err(|source| EngineError::Pattern { name: param.name.clone(), source })?;

    let mut error: Option<String> = None;
    loop {
        match prompter.input(param, error.as_deref()) {
            // Closing a text prompt and aborting are the same intent.
            Reply::Dismissed | Reply::Cancelled => return Ok(None),
            Reply::Value(text) => {
                if param.required && text.trim().is_empty() {
                    error = Some(format!("{} is required", param.display_name));
                    continue;
                }
                if let Some(re) = &pattern {
                    if !text.is_empty() && !re.is_match(&text) {
                        error = Some(match &param.pattern_error_message {
                            Some(msg) => msg.clone(),
                            None => format!(
                                "value must match pattern {}",
                                param.pattern.as_deref().unwrap_or_default()
                            ),
                        });
                        continue;
                    }
                }
                return Ok(Some(Value::Str(text)));
            }
        }
    }
}

fn prompt_boolean(param: &TemplateParameter, prompter: &mut dyn Prompter) -> Option<Value> {
    let default = default_bool(param);
    match prompter.confirm(param, default) {
        Reply::Value(b) => Some(Value::Bool(b)),
        Reply::Dismissed => Some(Value::Bool(default)),
        Reply::Cancelled => None,
    }
}

fn prompt_selection(param: &TemplateParameter, prompter: &mut dyn Prompter) -> Option<Value> {
    let default = default_selection_index(param);
    match prompter.select(param, default) {
        Reply::Value(i) => {
            let chosen = param.options.get(i).or_else(|| param.options.first());
            chosen.map(|o| Value::string(o.value.clone()))
        }
        Reply::Dismissed => param
            .options
            .get(default)
            .map(|o| Value::string(o.value.clone())),
        Reply::Cancelled => None,
    }
}

fn prompt_selection_many(param: &TemplateParameter, prompter: &mut dyn Prompter) -> Option<Value> {
    let defaults = default_flags(param);
    let flags = match prompter.multi_select(param, &defaults) {
        Reply::Value(flags) => flags,
        Reply::Dismissed => defaults.clone(),
        Reply::Cancelled => return None,
    };
    Some(flags_value(param, &flags))
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// The value a hidden parameter binds without interaction.
fn hidden_default(param: &TemplateParameter) -> Value {
    match param.kind {
        ParameterKind::String => match &param.default {
            Some(serde_json::Value::String(s)) => Value::string(s.clone()),
            Some(other) => Value::from_json(other),
            None => Value::string(""),
        },
        ParameterKind::Boolean => Value::Bool(default_bool(param)),
        ParameterKind::Selection => param
            .options
            .get(default_selection_index(param))
            .map(|o| Value::string(o.value.clone()))
            .unwrap_or(Value::Null),
        // A hidden multi-select deselects everything, defaults included.
        ParameterKind::SelectionMany => {
            flags_value(param, &vec![false; param.options.len()])
        }
    }
}

fn default_bool(param: &TemplateParameter) -> bool {
    matches!(param.default, Some(serde_json::Value::Bool(true)))
}

/// Index of the declared default option, falling back to the first.
fn default_selection_index(param: &TemplateParameter) -> usize {
    let Some(serde_json::Value::String(wanted)) = &param.default else {
        return 0;
    };
    param
        .options
        .iter()
        .position(|o| &o.value == wanted)
        .unwrap_or(0)
}

/// Preselection flags for a multi-select: the default is a JSON array of
/// option values.
fn default_flags(param: &TemplateParameter) -> Vec<bool> {
    let selected: Vec<&str> = match &param.default {
        Some(serde_json::Value::Array(items)) => {
            items.iter().filter_map(|v| v.as_str()).collect()
        }
        _ => Vec::new(),
    };
    param
        .options
        .iter()
        .map(|o| selected.contains(&o.value.as_str()))
        .collect()
}

/// A multi-select always binds a map with one boolean per declared option.
fn flags_value(param: &TemplateParameter, flags: &[bool]) -> Value {
    Value::Map(
        param
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| (o.value.clone(), Value::Bool(flags.get(i).copied().unwrap_or(false))))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use templar_core::types::SelectionOption;

    /// A prompter fed a fixed sequence of replies.
    pub struct ScriptedPrompter {
        replies: VecDeque<ScriptedReply>,
    }

    pub enum ScriptedReply {
        Text(Reply<String>),
        Flag(Reply<bool>),
        Choice(Reply<usize>),
        Choices(Reply<Vec<bool>>),
    }

    impl ScriptedPrompter {
        pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
            Self { replies: replies.into_iter().collect() }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&mut self, _param: &TemplateParameter, _error: Option<&str>) -> Reply<String> {
            match self.replies.pop_front() {
                Some(ScriptedReply::Text(r)) => r,
                _ => panic!("unexpected input prompt"),
            }
        }

        fn confirm(&mut self, _param: &TemplateParameter, _default: bool) -> Reply<bool> {
            match self.replies.pop_front() {
                Some(ScriptedReply::Flag(r)) => r,
                _ => panic!("unexpected confirm prompt"),
            }
        }

        fn select(&mut self, _param: &TemplateParameter, _default: usize) -> Reply<usize> {
            match self.replies.pop_front() {
                Some(ScriptedReply::Choice(r)) => r,
                _ => panic!("unexpected select prompt"),
            }
        }

        fn multi_select(
            &mut self,
            _param: &TemplateParameter,
            _defaults: &[bool],
        ) -> Reply<Vec<bool>> {
            match self.replies.pop_front() {
                Some(ScriptedReply::Choices(r)) => r,
                _ => panic!("unexpected multi-select prompt"),
            }
        }
    }

    fn param(name: &str, kind: ParameterKind) -> TemplateParameter {
        TemplateParameter {
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
            kind,
            default: None,
            options: vec![],
            required: false,
            pattern: None,
            pattern_error_message: None,
            visible_if: None,
        }
    }

    fn options(values: &[&str]) -> Vec<SelectionOption> {
        values
            .iter()
            .map(|v| SelectionOption { value: v.to_string(), label: v.to_uppercase() })
            .collect()
    }

    fn template(parameters: Vec<TemplateParameter>) -> Template {
        Template {
            name: "t".into(),
            description: String::new(),
            icon: None,
            category: None,
            files: vec![],
            parameters,
            variables: vec![],
            variables_script: None,
            variables_function: None,
            directory: None,
            repository_id: None,
            repository_name: None,
        }
    }

    fn exec() -> ExecContext {
        ExecContext::new("/ws", "/ws", "/repo")
    }

    fn values(collected: Collected) -> Namespace {
        match collected {
            Collected::Values(ns) => ns,
            Collected::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn collects_in_declaration_order() {
        let t = template(vec![
            param("name", ParameterKind::String),
            param("docs", ParameterKind::Boolean),
        ]);
        let mut p = ScriptedPrompter::new([
            ScriptedReply::Text(Reply::Value("Widget".into())),
            ScriptedReply::Flag(Reply::Value(true)),
        ]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("name"), Some(&Value::string("Widget")));
        assert_eq!(ns.get("docs"), Some(&Value::Bool(true)));
    }

    #[test]
    fn required_blank_reprompts() {
        let mut required = param("name", ParameterKind::String);
        required.required = true;
        let t = template(vec![required]);
        let mut p = ScriptedPrompter::new([
            ScriptedReply::Text(Reply::Value("  ".into())),
            ScriptedReply::Text(Reply::Value("ok".into())),
        ]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("name"), Some(&Value::string("ok")));
    }

    #[test]
    fn pattern_mismatch_reprompts_with_custom_message() {
        let mut slug = param("slug", ParameterKind::String);
        slug.pattern = Some("^[a-z-]+$".into());
        slug.pattern_error_message = Some("lowercase only".into());
        let t = template(vec![slug]);

        struct Capture {
            inner: ScriptedPrompter,
            seen_errors: Vec<String>,
        }
        impl Prompter for Capture {
            fn input(&mut self, p: &TemplateParameter, error: Option<&str>) -> Reply<String> {
                if let Some(e) = error {
                    self.seen_errors.push(e.to_string());
                }
                self.inner.input(p, error)
            }
            fn confirm(&mut self, p: &TemplateParameter, d: bool) -> Reply<bool> {
                self.inner.confirm(p, d)
            }
            fn select(&mut self, p: &TemplateParameter, d: usize) -> Reply<usize> {
                self.inner.select(p, d)
            }
            fn multi_select(&mut self, p: &TemplateParameter, d: &[bool]) -> Reply<Vec<bool>> {
                self.inner.multi_select(p, d)
            }
        }

        let mut p = Capture {
            inner: ScriptedPrompter::new([
                ScriptedReply::Text(Reply::Value("Not Valid".into())),
                ScriptedReply::Text(Reply::Value("valid".into())),
            ]),
            seen_errors: vec![],
        };
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("slug"), Some(&Value::string("valid")));
        assert_eq!(p.seen_errors, vec!["lowercase only".to_string()]);
    }

    #[test]
    fn string_dismissal_cancels() {
        let t = template(vec![param("name", ParameterKind::String)]);
        let mut p = ScriptedPrompter::new([ScriptedReply::Text(Reply::Dismissed)]);
        assert_eq!(
            collect_parameters(&t, &exec(), &mut p).unwrap(),
            Collected::Cancelled
        );
    }

    #[test]
    fn boolean_dismissal_takes_default() {
        let mut docs = param("docs", ParameterKind::Boolean);
        docs.default = Some(serde_json::Value::Bool(true));
        let t = template(vec![docs]);
        let mut p = ScriptedPrompter::new([ScriptedReply::Flag(Reply::Dismissed)]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("docs"), Some(&Value::Bool(true)));
    }

    #[test]
    fn selection_dismissal_takes_declared_default() {
        let mut db = param("db", ParameterKind::Selection);
        db.options = options(&["sqlite", "postgres"]);
        db.default = Some(serde_json::Value::String("postgres".into()));
        let t = template(vec![db]);
        let mut p = ScriptedPrompter::new([ScriptedReply::Choice(Reply::Dismissed)]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("db"), Some(&Value::string("postgres")));
    }

    #[test]
    fn selection_many_binds_every_option() {
        let mut feats = param("features", ParameterKind::SelectionMany);
        feats.options = options(&["auth", "logging", "metrics"]);
        let t = template(vec![feats]);
        let mut p = ScriptedPrompter::new([ScriptedReply::Choices(Reply::Value(vec![
            true, false, true,
        ]))]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        match ns.get("features") {
            Some(Value::Map(map)) => {
                assert_eq!(map.len(), 3, "every option must appear");
                assert_eq!(map.get("auth"), Some(&Value::Bool(true)));
                assert_eq!(map.get("logging"), Some(&Value::Bool(false)));
                assert_eq!(map.get("metrics"), Some(&Value::Bool(true)));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_aborts_mid_collection() {
        let t = template(vec![
            param("a", ParameterKind::String),
            param("b", ParameterKind::Boolean),
            param("c", ParameterKind::String),
        ]);
        let mut p = ScriptedPrompter::new([
            ScriptedReply::Text(Reply::Value("x".into())),
            ScriptedReply::Flag(Reply::Cancelled),
        ]);
        assert_eq!(
            collect_parameters(&t, &exec(), &mut p).unwrap(),
            Collected::Cancelled
        );
    }

    #[test]
    fn visible_if_sees_earlier_answers() {
        let mut gated = param("dbName", ParameterKind::String);
        gated.visible_if = Some("data.useDb".into());
        gated.default = Some(serde_json::Value::String("app".into()));
        let t = template(vec![param("useDb", ParameterKind::Boolean), gated]);

        // Visible branch: both prompts fire.
        let mut p = ScriptedPrompter::new([
            ScriptedReply::Flag(Reply::Value(true)),
            ScriptedReply::Text(Reply::Value("mydb".into())),
        ]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("dbName"), Some(&Value::string("mydb")));

        // Hidden branch: the gated parameter binds its default silently.
        let mut p = ScriptedPrompter::new([ScriptedReply::Flag(Reply::Value(false))]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        assert_eq!(ns.get("dbName"), Some(&Value::string("app")));
    }

    #[test]
    fn visible_if_cannot_see_later_answers() {
        let mut gated = param("first", ParameterKind::String);
        gated.visible_if = Some("data.later.length > 0".into());
        let t = template(vec![gated, param("later", ParameterKind::String)]);
        let mut p = ScriptedPrompter::new([ScriptedReply::Text(Reply::Value("x".into()))]);
        let err = collect_parameters(&t, &exec(), &mut p).unwrap_err();
        assert!(matches!(err, EngineError::Eval { .. }));
    }

    #[test]
    fn hidden_selection_many_is_all_false() {
        let mut feats = param("features", ParameterKind::SelectionMany);
        feats.options = options(&["auth", "metrics"]);
        feats.default = Some(serde_json::json!(["auth"]));
        feats.visible_if = Some("false".into());
        let t = template(vec![feats]);
        let mut p = ScriptedPrompter::new([]);
        let ns = values(collect_parameters(&t, &exec(), &mut p).unwrap());
        match ns.get("features") {
            Some(Value::Map(map)) => {
                assert_eq!(map.get("auth"), Some(&Value::Bool(false)));
                assert_eq!(map.get("metrics"), Some(&Value::Bool(false)));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }
}
