//! Leveled diagnostics collected during discovery and validation.
//!
//! The collector is an explicit value threaded through each pass and returned
//! to the caller — never a process-wide log. A fresh collector is created at
//! the start of every discovery cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::RepositoryId;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// One non-fatal finding from a discovery/validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub repository_id: RepositoryId,
    pub message: String,
    pub level: DiagnosticLevel,
}

/// Accumulator for [`Diagnostic`]s, append-only during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, repo: &RepositoryId, message: impl Into<String>) {
        self.push(repo, message, DiagnosticLevel::Info);
    }

    pub fn warning(&mut self, repo: &RepositoryId, message: impl Into<String>) {
        self.push(repo, message, DiagnosticLevel::Warning);
    }

    pub fn error(&mut self, repo: &RepositoryId, message: impl Into<String>) {
        self.push(repo, message, DiagnosticLevel::Error);
    }

    fn push(&mut self, repo: &RepositoryId, message: impl Into<String>, level: DiagnosticLevel) {
        self.entries.push(Diagnostic {
            repository_id: repo.clone(),
            message: message.into(),
            level,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entry reached [`DiagnosticLevel::Error`].
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    /// Fold another collector's entries into this one, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryId {
        RepositoryId::from("main")
    }

    #[test]
    fn push_preserves_order() {
        let mut diags = Diagnostics::new();
        diags.info(&repo(), "first");
        diags.warning(&repo(), "second");
        let messages: Vec<_> = diags.entries().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn has_errors_only_on_error_level() {
        let mut diags = Diagnostics::new();
        diags.info(&repo(), "fine");
        diags.warning(&repo(), "hmm");
        assert!(!diags.has_errors());
        diags.error(&repo(), "broken");
        assert!(diags.has_errors());
    }

    #[test]
    fn extend_appends_in_order() {
        let mut a = Diagnostics::new();
        a.info(&repo(), "a");
        let mut b = Diagnostics::new();
        b.warning(&repo(), "b");
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.entries()[1].message, "b");
    }

    #[test]
    fn level_ordering() {
        assert!(DiagnosticLevel::Info < DiagnosticLevel::Warning);
        assert!(DiagnosticLevel::Warning < DiagnosticLevel::Error);
    }
}
