//! Error types for templar-lang.

use std::path::PathBuf;

use thiserror::Error;

/// Compile-time failure in an expression, script, or micro-template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Lexer or parser rejection, with byte offset into the source.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// A `{{` with no matching `}}`.
    #[error("unclosed directive starting at offset {offset}")]
    UnclosedTag { offset: usize },

    /// A conditional/iteration block opened but never closed.
    #[error("unclosed {kind} block starting at offset {offset}")]
    UnclosedBlock { kind: &'static str, offset: usize },

    /// `{{?}}`, `{{??}}`, or `{{~}}` with no matching open.
    #[error("unexpected block close at offset {offset}")]
    StrayClose { offset: usize },

    /// Directive content the compiler does not recognize.
    #[error("unknown directive at offset {offset}: {content:?}")]
    UnknownDirective { offset: usize, content: String },
}

/// Runtime failure while evaluating an expression or rendering a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Property access on a value that has no properties.
    #[error("cannot read property '{property}' of {kind}")]
    PropertyOfNonObject { property: String, kind: &'static str },

    /// Indexing a value that cannot be indexed, or with a bad key type.
    #[error("cannot index {kind} with {key_kind}")]
    BadIndex { kind: &'static str, key_kind: &'static str },

    /// Calling a value that is not a function.
    #[error("{kind} is not callable")]
    NotCallable { kind: &'static str },

    /// A function was called with the wrong number of arguments.
    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity { name: String, expected: usize, got: usize },

    /// A function received an argument of the wrong type.
    #[error("{name}: expected {expected}, got {got}")]
    BadArgument { name: String, expected: &'static str, got: &'static str },

    /// An operator was applied to operand types it does not support.
    #[error("operator '{op}' not supported for {left} and {right}")]
    BadOperands { op: &'static str, left: &'static str, right: &'static str },

    /// An operation consumed `undefined` where a defined value is required.
    #[error("{context} is undefined")]
    Undefined { context: String },

    /// A value could not be converted to output text.
    #[error("cannot render {kind} as text")]
    NotRenderable { kind: &'static str },

    /// Iterating a non-list value.
    #[error("cannot iterate over {kind}")]
    NotIterable { kind: &'static str },
}

/// Why in-memory script parsing failed, before any file is involved.
#[derive(Debug, Error)]
pub enum ScriptParseError {
    #[error(transparent)]
    Compile(CompileError),
    #[error(transparent)]
    Init(EvalError),
}

/// Failure while loading or executing a variables script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script source did not parse.
    #[error("failed to parse script at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    /// Top-level initialization of the script failed.
    #[error("script initialization failed at {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: EvalError,
    },
}
