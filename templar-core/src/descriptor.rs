//! Parsing of per-repository `templates.json` descriptor files.
//!
//! A malformed descriptor is fatal for that repository only: the caller gets
//! a [`DescriptorError`], downgrades it to an error diagnostic, and the
//! repository contributes zero templates. Other repositories are unaffected.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DescriptorError;
use crate::types::Template;

/// Name of the descriptor file expected at a repository root.
pub const DESCRIPTOR_FILE: &str = "templates.json";

/// Root of a `templates.json` descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub templates: Vec<Template>,
}

/// `<repo_root>/templates.json` — pure, no I/O.
pub fn descriptor_path(repo_root: &Path) -> PathBuf {
    repo_root.join(DESCRIPTOR_FILE)
}

/// Load and parse the descriptor at a repository root.
///
/// Returns `DescriptorError::Missing` if the file does not exist and
/// `DescriptorError::Parse` (with path context) for malformed JSON or a
/// missing/non-array `templates` field.
pub fn load_descriptor(repo_root: &Path) -> Result<Descriptor, DescriptorError> {
    let path = descriptor_path(repo_root);
    if !path.exists() {
        return Err(DescriptorError::Missing { path });
    }
    let contents =
        std::fs::read_to_string(&path).map_err(|source| DescriptorError::Io { path: path.clone(), source })?;
    serde_json::from_str(&contents).map_err(|source| DescriptorError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_descriptor(dir: &Path, body: &str) {
        std::fs::write(dir.join(DESCRIPTOR_FILE), body).expect("write descriptor");
    }

    #[test]
    fn missing_descriptor_is_reported() {
        let repo = TempDir::new().expect("tempdir");
        let err = load_descriptor(repo.path()).unwrap_err();
        assert!(matches!(err, DescriptorError::Missing { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let repo = TempDir::new().expect("tempdir");
        write_descriptor(repo.path(), "{not json");
        let err = load_descriptor(repo.path()).unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
    }

    #[test]
    fn templates_field_must_be_an_array() {
        let repo = TempDir::new().expect("tempdir");
        write_descriptor(repo.path(), r#"{"templates": "nope"}"#);
        assert!(load_descriptor(repo.path()).is_err());
    }

    #[test]
    fn minimal_descriptor_parses() {
        let repo = TempDir::new().expect("tempdir");
        write_descriptor(
            repo.path(),
            r#"{"templates": [{"name": "api", "files": [
                {"source": "a.txt", "destination": "a.txt"}
            ]}]}"#,
        );
        let descriptor = load_descriptor(repo.path()).expect("load");
        assert_eq!(descriptor.templates.len(), 1);
        assert_eq!(descriptor.templates[0].name.0, "api");
    }

    #[test]
    fn empty_templates_array_is_valid_shape() {
        let repo = TempDir::new().expect("tempdir");
        write_descriptor(repo.path(), r#"{"templates": []}"#);
        let descriptor = load_descriptor(repo.path()).expect("load");
        assert!(descriptor.templates.is_empty());
    }
}
