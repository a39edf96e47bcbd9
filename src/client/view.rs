//! Diagnostics as last presented to an editor UI

use crate::types::{AnalysisResult, Diagnostic, Severity};

/// The most recently accepted analysis, replaced wholesale on each result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsView {
    diagnostics: Vec<Diagnostic>,
    execution_time_ms: Option<u64>,
    error: Option<String>,
    seq: Option<u64>,
    stale: bool,
}

impl DiagnosticsView {
    /// Build a view from an accepted result.
    ///
    /// An error result becomes a single synthetic error diagnostic at 1:1 so
    /// the problem list is never silently empty.
    pub fn from_result(result: AnalysisResult, seq: Option<u64>) -> Self {
        match result {
            AnalysisResult::Ok {
                diagnostics,
                execution_time,
            } => Self {
                diagnostics,
                execution_time_ms: Some(u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX)),
                error: None,
                seq,
                stale: false,
            },
            AnalysisResult::Error { message } => Self {
                diagnostics: vec![Diagnostic::unlocated(message.clone(), Severity::Error)],
                execution_time_ms: None,
                error: Some(message),
                seq,
                stale: false,
            },
        }
    }

    /// Diagnostics to render
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Analyzer time of the result, if it was a success
    pub fn execution_time_ms(&self) -> Option<u64> {
        self.execution_time_ms
    }

    /// Error message of the result, if it was a failure
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sequence number of the result, if the server echoed one
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Whether a newer request has gone unanswered past the client timeout
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Number of error-level diagnostics
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity().is_error()).count()
    }

    /// Number of warning-level diagnostics
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_ok_result() {
        let view = DiagnosticsView::from_result(
            AnalysisResult::ok(
                vec![Diagnostic::new(1, 1, 1, "w", Severity::Warning)],
                Duration::from_millis(30),
            ),
            Some(2),
        );
        assert_eq!(view.warning_count(), 1);
        assert_eq!(view.execution_time_ms(), Some(30));
        assert_eq!(view.seq(), Some(2));
        assert!(view.error().is_none());
    }

    #[test]
    fn test_error_result_becomes_synthetic_diagnostic() {
        let view = DiagnosticsView::from_result(
            AnalysisResult::error("Unsupported language: cobol"),
            None,
        );
        assert_eq!(view.error(), Some("Unsupported language: cobol"));
        assert_eq!(view.diagnostics().len(), 1);
        let diag = &view.diagnostics()[0];
        assert_eq!(diag.message(), "Unsupported language: cobol");
        assert_eq!((diag.line(), diag.column(), diag.length()), (1, 1, 1));
        assert_eq!(view.error_count(), 1);
    }

    #[test]
    fn test_default_is_empty() {
        let view = DiagnosticsView::default();
        assert!(view.diagnostics().is_empty());
        assert!(!view.is_stale());
    }
}
