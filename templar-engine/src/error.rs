//! Render-time error type for the engine.
//!
//! Validation-time problems never surface here — they degrade to
//! [`templar_core::Diagnostics`] entries and exclude the offending template.
//! `EngineError` covers the fatal failures of a single render: compile/eval
//! failures, empty destination paths, and I/O.

use std::path::PathBuf;

use thiserror::Error;

use templar_lang::{CompileError, EvalError, ScriptError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// A destination pattern, content file, or `dotjs` variable failed to
    /// compile.
    #[error("failed to compile {what}: {source}")]
    Compile {
        what: String,
        #[source]
        source: CompileError,
    },

    /// Expression evaluation or template rendering failed.
    #[error("failed to evaluate {what}: {source}")]
    Eval {
        what: String,
        #[source]
        source: EvalError,
    },

    /// The variables function returned something other than an object.
    #[error("variables function returned {kind}, expected an object")]
    ScriptNotAMap { kind: &'static str },

    /// A resolved variable ended up `undefined`.
    #[error("variable '{name}' resolved to undefined")]
    UndefinedVariable { name: String },

    /// A parameter pattern failed to compile at prompt time.
    #[error("invalid pattern for parameter '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// A destination pattern rendered to a blank path.
    #[error("destination pattern {pattern:?} rendered to an empty path")]
    PathEmpty { pattern: String },

    /// The template was never decorated with its repository directory.
    #[error("template '{name}' has no repository directory attached")]
    Detached { name: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Attach path context to a raw I/O error.
pub(crate) fn io_err(path: &std::path::Path, source: std::io::Error) -> EngineError {
    EngineError::Io { path: path.to_path_buf(), source }
}
