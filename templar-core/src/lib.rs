//! templar core library — descriptor model, diagnostics, configuration.
//!
//! Public API surface:
//! - [`types`] — newtypes, parameter/variable kinds, descriptor structs
//! - [`diagnostics`] — [`Diagnostic`] and the explicit [`Diagnostics`] collector
//! - [`descriptor`] — `templates.json` loading
//! - [`config`] — `~/.templar/config.yaml` load / save
//! - [`error`] — [`DescriptorError`], [`ConfigError`]

pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod types;

pub use config::{AuthorInfo, Config, OrganizationInfo};
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use error::{ConfigError, DescriptorError};
pub use types::{
    CustomVariable, ParameterKind, Repository, RepositoryId, SelectionOption, Template,
    TemplateFile, TemplateName, TemplateParameter, VariableKind,
};
