//! Runtime values and the accumulated namespace.
//!
//! `Undefined` is distinct from `Null`: it marks a binding or property that
//! does not exist. Most operations on `Undefined` raise [`EvalError`], which
//! is what makes forward-only variable visibility observable as a failure
//! instead of silently producing the text "undefined".

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::EvalError;

/// A host-native function callable from the expression language.
#[derive(Clone)]
pub struct NativeFn {
    pub name: String,
    func: Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self { name: name.into(), func: Rc::new(func) }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// A value in the expression language.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A binding or property that does not exist.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Function(NativeFn),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Human-readable kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Truthiness: `undefined`, `null`, `false`, `0`, `NaN`, and `""` are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null | Value::Bool(false) => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(true) | Value::List(_) | Value::Map(_) | Value::Function(_) => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Render the value as output text.
    ///
    /// `null` renders empty; `undefined`, maps, and functions are errors —
    /// interpolating them is almost always an authoring bug.
    pub fn to_output(&self) -> Result<String, EvalError> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(format_number(*n)),
            Value::Str(s) => Ok(s.clone()),
            Value::List(items) => {
                let parts: Result<Vec<_>, _> = items.iter().map(Value::to_output).collect();
                Ok(parts?.join(","))
            }
            Value::Undefined | Value::Map(_) | Value::Function(_) => {
                Err(EvalError::NotRenderable { kind: self.kind() })
            }
        }
    }

    /// Convert from a JSON value (descriptor defaults, prompt replies).
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

}

/// Strict equality without coercion, except that numbers compare by value.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// The ordered accumulation of key→value bindings built during resolution.
///
/// Lookup is by key; evaluation order is enforced by the callers, which fold
/// stage results into a fresh `Namespace` value rather than mutating shared
/// state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `self` and return a namespace with `key` bound to `value`,
    /// overwriting on collision.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Consume `self` and fold every binding of `other` over it.
    pub fn merged(mut self, other: Namespace) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// The namespace as a single `data` object value.
    pub fn to_value(&self) -> Value {
        Value::Map(self.entries.clone())
    }
}

impl From<BTreeMap<String, Value>> for Namespace {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matrix() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(1.5).is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
        assert!(Value::Map(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn output_rendering() {
        assert_eq!(Value::string("hi").to_output().unwrap(), "hi");
        assert_eq!(Value::Number(3.0).to_output().unwrap(), "3");
        assert_eq!(Value::Number(3.25).to_output().unwrap(), "3.25");
        assert_eq!(Value::Bool(true).to_output().unwrap(), "true");
        assert_eq!(Value::Null.to_output().unwrap(), "");
        let list = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(list.to_output().unwrap(), "1,2");
    }

    #[test]
    fn undefined_is_not_renderable() {
        let err = Value::Undefined.to_output().unwrap_err();
        assert!(matches!(err, EvalError::NotRenderable { kind: "undefined" }));
    }

    #[test]
    fn from_json_covers_every_shape() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [true, "x"], "c": null}"#).unwrap();
        let value = Value::from_json(&json);
        let expected = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::Number(1.0)),
            (
                "b".to_string(),
                Value::List(vec![Value::Bool(true), Value::string("x")]),
            ),
            ("c".to_string(), Value::Null),
        ]));
        assert_eq!(value, expected);
    }

    #[test]
    fn equality_is_strict() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::string("1"));
        assert_ne!(Value::Null, Value::Undefined);
    }

    #[test]
    fn namespace_fold_overwrites_on_collision() {
        let ns = Namespace::new()
            .with("a", Value::Number(1.0))
            .with("b", Value::Number(2.0));
        let overlay = Namespace::new().with("b", Value::Number(3.0));
        let merged = ns.merged(overlay);
        assert_eq!(merged.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(merged.get("b"), Some(&Value::Number(3.0)));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn namespace_to_value_is_a_map() {
        let ns = Namespace::new().with("name", Value::string("Widget"));
        match ns.to_value() {
            Value::Map(map) => assert_eq!(map.get("name"), Some(&Value::string("Widget"))),
            other => panic!("expected map, got {other:?}"),
        }
    }
}
