//! Non-fatal problems found while converting rows or consolidating groups of lines.
//!
//! A diagnostic never aborts the run. It is logged with `warn!` when recorded and collected so
//! that commands can report it and tests can assert on it.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What kind of problem a `Diagnostic` reports.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The row did not have the shape the adapter expects and was skipped.
    MalformedRow,
    /// The row has a transaction category the adapter has no rule for and was skipped.
    UnhandledCategory,
    /// A multi-line pattern failed validation; its lines were passed through unmerged.
    Unconsolidated,
}

serde_plain::derive_display_from_serialize!(DiagnosticKind);
serde_plain::derive_fromstr_from_deserialize!(DiagnosticKind);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records and logs a diagnostic.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.0.push(Diagnostic { kind, message });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// The number of recorded diagnostics of `kind`.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.0.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_count() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        diagnostics.push(DiagnosticKind::UnhandledCategory, "Unhandled txType: gift.");
        diagnostics.push(DiagnosticKind::Unconsolidated, "no");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::UnhandledCategory), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::MalformedRow), 0);
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.message(), "Unhandled txType: gift.");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DiagnosticKind::MalformedRow.to_string(), "malformed_row");
    }
}
