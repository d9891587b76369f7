//! Templar engine — discovery, validation, prompting, resolution, and
//! materialization.
//!
//! The pipeline for one render:
//! 1. [`validate::discover_templates`] — scan repositories, validate
//!    descriptors, collect diagnostics.
//! 2. [`prompt::collect_parameters`] — ask the user, via a caller-supplied
//!    [`prompt::Prompter`].
//! 3. [`resolve::resolve_variables`] — fold built-ins, parameters, script
//!    output, and inline variables into one namespace.
//! 4. [`materialize::materialize`] — render destinations and contents,
//!    write files.

pub mod context;
pub mod error;
pub mod materialize;
pub mod prompt;
pub mod resolve;
pub mod validate;

pub use context::ExecContext;
pub use error::EngineError;
pub use materialize::materialize;
pub use prompt::{collect_parameters, Collected, Prompter, Reply};
pub use resolve::resolve_variables;
pub use validate::{discover_templates, validate_template, LoadedTemplate};
