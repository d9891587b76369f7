//! Error types for templar-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from descriptor loading.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// No `templates.json` at the repository root.
    #[error("no descriptor found at {path}")]
    Missing { path: PathBuf },

    /// Underlying I/O failure while reading the descriptor.
    #[error("failed to read descriptor at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or wrong descriptor shape.
    #[error("failed to parse descriptor at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All errors that can arise from configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.templar/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
