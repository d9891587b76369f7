//! Templar expression language, micro-template compiler, and script runtime.
//!
//! Everything here is host-controlled: the grammar reaches only the bindings
//! and functions the caller installs, never the filesystem or process
//! environment on its own.
//!
//! - [`value`] — the [`Value`] model and [`Namespace`] accumulator
//! - [`parser`] — expression grammar, [`parse_expression`]
//! - [`eval`] — scoped evaluation of parsed expressions
//! - [`template`] — `{{…}}` micro-template compiler and renderer
//! - [`script`] — variables-script loading and execution
//! - [`error`] — compile, eval, and script error types

pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod script;
pub mod template;
pub mod value;

pub use error::{CompileError, EvalError, ScriptError};
pub use eval::{eval, eval_str, Scope};
pub use parser::parse_expression;
pub use script::{load_function, Script, ScriptFunction, SCRIPT_EXTENSION};
pub use template::{compile, render_str, CompiledTemplate};
pub use value::{Namespace, Value};
