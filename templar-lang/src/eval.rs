//! Expression evaluator.
//!
//! Evaluation happens against a [`Scope`] — a stack of binding frames the
//! caller controls completely. There is no ambient global state: an
//! expression can only see what was explicitly bound (`data`, `context`,
//! loop variables) plus the whitelisted string/list methods below.

use std::collections::BTreeMap;

use crate::error::EvalError;
use crate::parser::{BinaryOp, Expr, UnaryOp};
use crate::value::{NativeFn, Value};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Stack of binding frames; innermost frame wins on lookup.
#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<BTreeMap<String, Value>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![BTreeMap::new()] }
    }

    /// A scope with one frame holding the given bindings.
    pub fn with_bindings(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self { frames: vec![pairs.into_iter().collect()] }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(BTreeMap::new());
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the root frame");
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame, shadowing outer bindings.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name.into(), value);
            }
            None => self.frames.push(BTreeMap::from([(name.into(), value)])),
        }
    }

    /// Rebind an existing `name` in the innermost frame that has it.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(EvalError::Undefined { context: format!("assignment target '{name}'") })
    }

    /// Resolve `name`; an absent binding is `Undefined`, not an error.
    pub fn lookup(&self, name: &str) -> Value {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return value.clone();
            }
        }
        Value::Undefined
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate `expr` against `scope`.
pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Ident(name) => Ok(scope.lookup(name)),
        Expr::List(items) => {
            let values: Result<Vec<_>, _> = items.iter().map(|e| eval(e, scope)).collect();
            Ok(Value::List(values?))
        }
        Expr::MapLit(fields) => {
            let mut map = BTreeMap::new();
            for (key, value_expr) in fields {
                map.insert(key.clone(), eval(value_expr, scope)?);
            }
            Ok(Value::Map(map))
        }
        Expr::Member { object, property } => {
            let receiver = eval(object, scope)?;
            member(&receiver, property)
        }
        Expr::Index { object, index } => {
            let receiver = eval(object, scope)?;
            let key = eval(index, scope)?;
            index_value(&receiver, &key)
        }
        Expr::Call { callee, args } => {
            let target = eval(callee, scope)?;
            let arg_values: Result<Vec<_>, _> = args.iter().map(|a| eval(a, scope)).collect();
            match target {
                Value::Function(f) => f.call(&arg_values?),
                other => Err(EvalError::NotCallable { kind: other.kind() }),
            }
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::BadArgument {
                        name: "unary '-'".into(),
                        expected: "number",
                        got: other.kind(),
                    }),
                },
            }
        }
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, scope),
        Expr::Ternary { cond, then, otherwise } => {
            if eval(cond, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    // Logical operators short-circuit and return the deciding operand, so
    // `data.x || 'fallback'` works the way template authors expect.
    match op {
        BinaryOp::And => {
            let l = eval(left, scope)?;
            return if l.is_truthy() { eval(right, scope) } else { Ok(l) };
        }
        BinaryOp::Or => {
            let l = eval(left, scope)?;
            return if l.is_truthy() { Ok(l) } else { eval(right, scope) };
        }
        _ => {}
    }

    let l = eval(left, scope)?;
    let r = eval(right, scope)?;
    let mismatch = || EvalError::BadOperands { op: op.symbol(), left: l.kind(), right: r.kind() };

    match op {
        BinaryOp::Add => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", l.to_output()?, r.to_output()?)))
            }
            _ => Err(mismatch()),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })),
            _ => Err(mismatch()),
        },
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => {
                    a.partial_cmp(b).ok_or_else(mismatch)?
                }
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => return Err(mismatch()),
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Eq => Ok(Value::Bool(l == r)),
        BinaryOp::NotEq => Ok(Value::Bool(l != r)),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

// ---------------------------------------------------------------------------
// Members and indexing
// ---------------------------------------------------------------------------

/// Resolve `receiver.property`.
///
/// Maps look up keys (absent → `Undefined`); strings and lists expose
/// `length` plus a whitelisted method set; anything else has no properties.
pub fn member(receiver: &Value, property: &str) -> Result<Value, EvalError> {
    match receiver {
        Value::Map(map) => Ok(map.get(property).cloned().unwrap_or(Value::Undefined)),
        Value::Str(s) => Ok(string_member(s, property)),
        Value::List(items) => Ok(list_member(items, property)),
        Value::Undefined | Value::Null => Err(EvalError::PropertyOfNonObject {
            property: property.to_string(),
            kind: receiver.kind(),
        }),
        _ => Err(EvalError::PropertyOfNonObject {
            property: property.to_string(),
            kind: receiver.kind(),
        }),
    }
}

fn index_value(receiver: &Value, key: &Value) -> Result<Value, EvalError> {
    match (receiver, key) {
        (Value::List(items), Value::Number(n)) => {
            if n.fract() != 0.0 || *n < 0.0 {
                return Ok(Value::Undefined);
            }
            Ok(items.get(*n as usize).cloned().unwrap_or(Value::Undefined))
        }
        (Value::Map(map), Value::Str(k)) => {
            Ok(map.get(k).cloned().unwrap_or(Value::Undefined))
        }
        _ => Err(EvalError::BadIndex { kind: receiver.kind(), key_kind: key.kind() }),
    }
}

fn string_member(s: &str, property: &str) -> Value {
    let receiver = s.to_string();
    match property {
        "length" => Value::Number(s.chars().count() as f64),
        "toLowerCase" => method0(property, receiver, |s| Value::Str(s.to_lowercase())),
        "toUpperCase" => method0(property, receiver, |s| Value::Str(s.to_uppercase())),
        "trim" => method0(property, receiver, |s| Value::Str(s.trim().to_string())),
        "split" => method1(property, receiver, |s, sep| {
            Value::List(s.split(&sep).map(Value::string).collect())
        }),
        "replace" => {
            let name = property.to_string();
            Value::Function(NativeFn::new(property, move |args| {
                let from = str_arg(&name, args, 0)?;
                let to = str_arg(&name, args, 1)?;
                // First occurrence only, matching the JS semantics template
                // authors know.
                Ok(Value::Str(receiver.replacen(&from, &to, 1)))
            }))
        }
        "startsWith" => method1(property, receiver, |s, p| Value::Bool(s.starts_with(&p))),
        "endsWith" => method1(property, receiver, |s, p| Value::Bool(s.ends_with(&p))),
        "includes" => method1(property, receiver, |s, p| Value::Bool(s.contains(&p))),
        _ => Value::Undefined,
    }
}

fn list_member(items: &[Value], property: &str) -> Value {
    match property {
        "length" => Value::Number(items.len() as f64),
        "join" => {
            let items = items.to_vec();
            Value::Function(NativeFn::new("join", move |args| {
                let sep = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    None => ",".to_string(),
                    Some(other) => {
                        return Err(EvalError::BadArgument {
                            name: "join".into(),
                            expected: "string",
                            got: other.kind(),
                        })
                    }
                };
                let parts: Result<Vec<_>, _> = items.iter().map(Value::to_output).collect();
                Ok(Value::Str(parts?.join(&sep)))
            }))
        }
        "includes" => {
            let items = items.to_vec();
            Value::Function(NativeFn::new("includes", move |args| {
                let needle = args.first().cloned().unwrap_or(Value::Undefined);
                Ok(Value::Bool(items.iter().any(|v| *v == needle)))
            }))
        }
        _ => Value::Undefined,
    }
}

fn method0(name: &str, receiver: String, body: fn(&str) -> Value) -> Value {
    let name = name.to_string();
    Value::Function(NativeFn::new(name.clone(), move |args| {
        if !args.is_empty() {
            return Err(EvalError::Arity { name: name.clone(), expected: 0, got: args.len() });
        }
        Ok(body(&receiver))
    }))
}

fn method1(name: &str, receiver: String, body: fn(&str, String) -> Value) -> Value {
    let name = name.to_string();
    Value::Function(NativeFn::new(name.clone(), move |args| {
        let arg = str_arg(&name, args, 0)?;
        Ok(body(&receiver, arg))
    }))
}

fn str_arg(name: &str, args: &[Value], index: usize) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(EvalError::BadArgument {
            name: name.to_string(),
            expected: "string",
            got: other.kind(),
        }),
        None => Err(EvalError::Arity {
            name: name.to_string(),
            expected: index + 1,
            got: args.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Convenience entry point
// ---------------------------------------------------------------------------

/// Parse and evaluate `source` with the given bindings in one step.
pub fn eval_str(
    source: &str,
    bindings: impl IntoIterator<Item = (String, Value)>,
) -> Result<Value, EvalError> {
    let expr = crate::parser::parse_expression(source).map_err(|e| EvalError::Undefined {
        context: format!("expression failed to parse: {e}"),
    })?;
    eval(&expr, &Scope::with_bindings(bindings))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
