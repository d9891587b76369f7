//! Domain types for the templar descriptor model.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Descriptor-facing types deserialize from `templates.json` via serde_json;
//! runtime-attached fields are serde-skipped and filled in during discovery.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed template name, unique within one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateName(pub String);

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed identifier for a template repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(pub String);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of a template parameter — a closed set, matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    #[default]
    String,
    Boolean,
    Selection,
    SelectionMany,
}

impl ParameterKind {
    /// Whether this kind requires a non-empty `options` list.
    pub fn needs_options(&self) -> bool {
        matches!(self, ParameterKind::Selection | ParameterKind::SelectionMany)
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::String => write!(f, "string"),
            ParameterKind::Boolean => write!(f, "boolean"),
            ParameterKind::Selection => write!(f, "selection"),
            ParameterKind::SelectionMany => write!(f, "selectionMany"),
        }
    }
}

/// How a custom variable's `value` string is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// A restricted host expression with `data`/`context` bindings.
    #[default]
    Js,
    /// A micro-template rendered against the namespace so far.
    DotJs,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Js => write!(f, "js"),
            VariableKind::DotJs => write!(f, "dotjs"),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor structs
// ---------------------------------------------------------------------------

/// A single file produced by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    /// Source path, relative to the repository root.
    pub source: String,
    /// Destination path pattern — a micro-template string.
    pub destination: String,
    /// When `false`, content is copied verbatim instead of rendered.
    #[serde(default = "default_true")]
    pub process: bool,
}

fn default_true() -> bool {
    true
}

/// One choice offered by a selection parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub value: String,
    pub label: String,
}

/// A parameter collected from the user before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    /// Namespace key the collected value is bound to.
    pub name: String,
    /// Label shown when prompting.
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Declared default, used when hidden or dismissed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectionOption>,
    #[serde(default)]
    pub required: bool,
    /// Regex the entered string must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_error_message: Option<String>,
    /// Expression gating whether the parameter is prompted at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,
}

/// A derived value computed during variable resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomVariable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expression (`js`) or micro-template (`dotjs`) source text.
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
}

/// A template group as declared in `templates.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: TemplateName,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub files: Vec<TemplateFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TemplateParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<CustomVariable>,
    /// Relative path to a `.vars` script providing generated variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables_script: Option<String>,
    /// Function looked up in the script; defaults to `generateVariables`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables_function: Option<String>,

    /// Repository root the template was loaded from (attached at discovery).
    #[serde(skip)]
    pub directory: Option<PathBuf>,
    /// Owning repository id (attached at discovery).
    #[serde(skip)]
    pub repository_id: Option<RepositoryId>,
    /// Owning repository display name (attached at discovery).
    #[serde(skip)]
    pub repository_name: Option<String>,
}

impl Template {
    /// The script function name to resolve, applying the default.
    pub fn variables_function_name(&self) -> &str {
        self.variables_function
            .as_deref()
            .unwrap_or("generateVariables")
    }

    /// Category used for grouping, with the descriptor's absence default.
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("Uncategorized")
    }
}

/// A template repository known to the process — local path plus identity.
///
/// Synchronization (clone/pull) is an external collaborator; discovery only
/// needs the identity and the on-disk location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
    /// Local checkout root containing `templates.json`.
    pub path: PathBuf,
}

impl Repository {
    /// Whether the repository is present on disk and usable for discovery.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
