//! Process configuration: author/organization info and known repositories.
//!
//! # Storage layout
//!
//! ```text
//! ~/.templar/
//!   config.yaml   (author, organization, repositories)
//! ```
//!
//! # API pattern
//!
//! Every function touching the config has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Repository;

/// Author identity substituted into templates as built-in variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl AuthorInfo {
    /// `"First Last"`, degrading to whichever part is present.
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Organization identity substituted into templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    #[serde(default)]
    pub name: String,
}

/// Root of `~/.templar/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub author: AuthorInfo,
    #[serde(default)]
    pub organization: OrganizationInfo,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

/// `<home>/.templar/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".templar").join("config.yaml")
}

/// Load the config, returning defaults when no file exists yet.
pub fn load_config_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// `load_config_at` convenience wrapper.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_at(&home()?)
}

/// Atomically save the config: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_config_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_file_name("config.yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// `save_config_at` convenience wrapper.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_at(&home()?, config)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_yields_defaults() {
        let home = TempDir::new().expect("tempdir");
        let config = load_config_at(home.path()).expect("load");
        assert_eq!(config, Config::default());
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().expect("tempdir");
        let config = Config {
            author: AuthorInfo {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.org".into(),
            },
            organization: OrganizationInfo { name: "Analytical".into() },
            repositories: vec![Repository {
                id: "main".into(),
                name: "Main templates".into(),
                path: PathBuf::from("/srv/templates"),
            }],
        };
        save_config_at(home.path(), &config).expect("save");
        let loaded = load_config_at(home.path()).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn atomic_save_cleans_up_tmp() {
        let home = TempDir::new().expect("tempdir");
        save_config_at(home.path(), &Config::default()).expect("save");
        let tmp = config_path_at(home.path()).with_file_name("config.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn full_name_degrades_gracefully() {
        let both = AuthorInfo {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: String::new(),
        };
        assert_eq!(both.full_name(), "Ada Lovelace");

        let first_only = AuthorInfo { first_name: "Ada".into(), ..Default::default() };
        assert_eq!(first_only.full_name(), "Ada");

        let last_only = AuthorInfo { last_name: "Lovelace".into(), ..Default::default() };
        assert_eq!(last_only.full_name(), "Lovelace");

        assert_eq!(AuthorInfo::default().full_name(), "");
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let home = TempDir::new().expect("tempdir");
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, "author: [not a map").expect("write");
        let err = load_config_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
