//! Request and result types for a single analysis

use crate::types::{Diagnostic, Severity};
use std::time::Duration;

/// A request to analyze a complete source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    /// Language identifier as received; validated by the dispatcher
    pub language: String,
    /// Full source text
    pub code: String,
}

impl AnalyzeRequest {
    /// Create a new request
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
        }
    }
}

/// Outcome of one dispatched request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// The analyzer ran; `diagnostics` may be empty
    Ok {
        /// Findings in analyzer order
        diagnostics: Vec<Diagnostic>,
        /// Wall-clock time of the analyzer call
        execution_time: Duration,
    },
    /// The request could not be analyzed
    Error {
        /// Short human-readable description
        message: String,
    },
}

impl AnalysisResult {
    /// Build a successful result
    pub fn ok(diagnostics: Vec<Diagnostic>, execution_time: Duration) -> Self {
        AnalysisResult::Ok {
            diagnostics,
            execution_time,
        }
    }

    /// Build a failed result
    pub fn error(message: impl Into<String>) -> Self {
        AnalysisResult::Error {
            message: message.into(),
        }
    }

    /// Whether this is an `Ok` result
    pub fn is_ok(&self) -> bool {
        matches!(self, AnalysisResult::Ok { .. })
    }

    /// Diagnostics of an `Ok` result, empty for errors
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            AnalysisResult::Ok { diagnostics, .. } => diagnostics,
            AnalysisResult::Error { .. } => &[],
        }
    }

    /// Execution time in whole milliseconds, if the analyzer ran
    pub fn execution_time_ms(&self) -> Option<u64> {
        match self {
            AnalysisResult::Ok { execution_time, .. } => {
                Some(u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX))
            }
            AnalysisResult::Error { .. } => None,
        }
    }

    /// Number of error-level diagnostics
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning-level diagnostics
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }
}
