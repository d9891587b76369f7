//! Execution context — the `context` binding visible to expressions,
//! `visibleIf` conditions, and variables scripts.
//!
//! The context is the only bridge from the restricted language to host
//! facilities, and every function on it is installed here by name. Scripts
//! cannot reach anything that is not in this table.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};

use templar_lang::value::NativeFn;
use templar_lang::{EvalError, Value};

/// Directories a render runs against.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Root of the workspace the user is scaffolding into.
    pub workspace_dir: PathBuf,
    /// Directory the command was invoked from (target for relative paths).
    pub execution_dir: PathBuf,
    /// Repository root of the template being rendered.
    pub template_dir: PathBuf,
}

impl ExecContext {
    pub fn new(
        workspace_dir: impl Into<PathBuf>,
        execution_dir: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            execution_dir: execution_dir.into(),
            template_dir: template_dir.into(),
        }
    }

    /// The `context` object bound during evaluation.
    pub fn to_value(&self) -> Value {
        Value::Map(
            [
                ("workspaceDir".to_string(), path_value(&self.workspace_dir)),
                ("executionDir".to_string(), path_value(&self.execution_dir)),
                ("templateDir".to_string(), path_value(&self.template_dir)),
                ("utils".to_string(), utils_table()),
            ]
            .into(),
        )
    }
}

fn path_value(path: &Path) -> Value {
    Value::string(path.to_string_lossy())
}

// ---------------------------------------------------------------------------
// Utility function table
// ---------------------------------------------------------------------------

/// Build the `context.utils` object.
///
/// `findFiles` and `fileExists` are deliberate stubs: workspace search is a
/// host-shell concern and the engine answers "nothing found" rather than
/// growing filesystem reach. They exist so descriptors written against the
/// full surface still resolve.
fn utils_table() -> Value {
    let entries = [
        case_fn("camelCase", Case::Camel),
        case_fn("pascalCase", Case::Pascal),
        case_fn("snakeCase", Case::Snake),
        case_fn("kebabCase", Case::Kebab),
        native("joinPath", join_path),
        native("basename", basename),
        native("dirname", dirname),
        native("formatDate", format_date),
        native("uuid", |_args| Ok(Value::string(uuid::Uuid::new_v4().to_string()))),
        native("findFiles", |_args| Ok(Value::List(Vec::new()))),
        native("fileExists", |_args| Ok(Value::Bool(false))),
    ];
    Value::Map(
        entries
            .into_iter()
            .map(|f| (f.name.clone(), Value::Function(f)))
            .collect(),
    )
}

fn native(
    name: &'static str,
    func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
) -> NativeFn {
    NativeFn::new(name, func)
}

fn case_fn(name: &'static str, case: Case) -> NativeFn {
    NativeFn::new(name, move |args: &[Value]| {
        let text = str_arg(name, args, 0)?;
        Ok(Value::string(text.to_case(case)))
    })
}

fn join_path(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Arity {
            name: "joinPath".into(),
            expected: 1,
            got: 0,
        });
    }
    let mut path = PathBuf::new();
    for (i, _) in args.iter().enumerate() {
        path.push(str_arg("joinPath", args, i)?);
    }
    Ok(path_value(&path))
}

fn basename(args: &[Value]) -> Result<Value, EvalError> {
    let text = str_arg("basename", args, 0)?;
    let name = Path::new(&text)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Value::string(name))
}

fn dirname(args: &[Value]) -> Result<Value, EvalError> {
    let text = str_arg("dirname", args, 0)?;
    let dir = Path::new(&text)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Value::string(dir))
}

/// `formatDate(fmt)` — the current local time via chrono strftime syntax.
fn format_date(args: &[Value]) -> Result<Value, EvalError> {
    let fmt = str_arg("formatDate", args, 0)?;
    let mut out = String::new();
    // chrono reports bad specifiers through the Display impl; catch the
    // fmt::Error instead of panicking in to_string().
    write!(out, "{}", chrono::Local::now().format(&fmt)).map_err(|_| EvalError::BadArgument {
        name: "formatDate".into(),
        expected: "a valid strftime format",
        got: "string",
    })?;
    Ok(Value::string(out))
}

fn str_arg(name: &'static str, args: &[Value], index: usize) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(EvalError::BadArgument {
            name: name.into(),
            expected: "string",
            got: other.kind(),
        }),
        None => Err(EvalError::Arity {
            name: name.into(),
            expected: index + 1,
            got: args.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use templar_lang::eval::Scope;
    use templar_lang::{eval, parse_expression};

    fn ctx() -> ExecContext {
        ExecContext::new("/ws", "/ws/app", "/repos/main")
    }

    fn eval_with_context(source: &str) -> Result<Value, EvalError> {
        let expr = parse_expression(source).expect("parse");
        let scope = Scope::with_bindings([("context".to_string(), ctx().to_value())]);
        eval::eval(&expr, &scope)
    }

    #[test]
    fn directories_are_exposed() {
        assert_eq!(
            eval_with_context("context.workspaceDir").unwrap(),
            Value::string("/ws")
        );
        assert_eq!(
            eval_with_context("context.templateDir").unwrap(),
            Value::string("/repos/main")
        );
    }

    #[test]
    fn case_helpers() {
        assert_eq!(
            eval_with_context("context.utils.camelCase('my widget')").unwrap(),
            Value::string("myWidget")
        );
        assert_eq!(
            eval_with_context("context.utils.pascalCase('my widget')").unwrap(),
            Value::string("MyWidget")
        );
        assert_eq!(
            eval_with_context("context.utils.snakeCase('My Widget')").unwrap(),
            Value::string("my_widget")
        );
        assert_eq!(
            eval_with_context("context.utils.kebabCase('My Widget')").unwrap(),
            Value::string("my-widget")
        );
    }

    #[test]
    fn path_helpers() {
        assert_eq!(
            eval_with_context("context.utils.joinPath('a', 'b', 'c.txt')").unwrap(),
            Value::string("a/b/c.txt")
        );
        assert_eq!(
            eval_with_context("context.utils.basename('a/b/c.txt')").unwrap(),
            Value::string("c.txt")
        );
        assert_eq!(
            eval_with_context("context.utils.dirname('a/b/c.txt')").unwrap(),
            Value::string("a/b")
        );
    }

    #[test]
    fn uuid_is_unique_per_call() {
        let a = eval_with_context("context.utils.uuid()").unwrap();
        let b = eval_with_context("context.utils.uuid()").unwrap();
        assert_ne!(a, b);
        match a {
            Value::Str(s) => assert_eq!(s.len(), 36),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn format_date_renders_year() {
        let year = chrono::Local::now().format("%Y").to_string();
        assert_eq!(
            eval_with_context("context.utils.formatDate('%Y')").unwrap(),
            Value::string(year)
        );
    }

    #[test]
    fn search_helpers_are_stubs() {
        assert_eq!(
            eval_with_context("context.utils.findFiles('**/*.rs')").unwrap(),
            Value::List(Vec::new())
        );
        assert_eq!(
            eval_with_context("context.utils.fileExists('Cargo.toml')").unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn non_string_argument_is_rejected() {
        let err = eval_with_context("context.utils.camelCase(42)").unwrap_err();
        assert!(matches!(err, EvalError::BadArgument { .. }));
    }
}
