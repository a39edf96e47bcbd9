//! The normalized diagnostic model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error level
    Error,
    /// Warning level
    Warning,
    /// Informational level
    Info,
}

impl Severity {
    /// Whether this is an error
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One analysis finding.
///
/// Positions are 1-based and `length` is at least 1. The constructors clamp
/// out-of-range values, so every `Diagnostic` in circulation satisfies the
/// invariant. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDiagnostic")]
pub struct Diagnostic {
    line: usize,
    column: usize,
    message: String,
    severity: Severity,
    length: usize,
}

#[derive(Deserialize)]
struct RawDiagnostic {
    line: usize,
    column: usize,
    message: String,
    severity: Severity,
    #[serde(default = "one")]
    length: usize,
}

fn one() -> usize {
    1
}

impl From<RawDiagnostic> for Diagnostic {
    fn from(raw: RawDiagnostic) -> Self {
        Diagnostic::new(raw.line, raw.column, raw.length, raw.message, raw.severity)
    }
}

impl Diagnostic {
    /// Message used when a request carries no code
    pub const NO_CODE_MESSAGE: &'static str = "No code provided";

    /// Create a diagnostic at a 1-based position
    pub fn new(
        line: usize,
        column: usize,
        length: usize,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            line: line.max(1),
            column: column.max(1),
            message: message.into(),
            severity,
            length: length.max(1),
        }
    }

    /// Create a diagnostic that cannot be attributed to a location (1:1, length 1)
    pub fn unlocated(message: impl Into<String>, severity: Severity) -> Self {
        Self::new(1, 1, 1, message, severity)
    }

    /// Create a diagnostic from a 0-based line/character pair
    pub fn from_zero_based(
        line: usize,
        character: usize,
        length: usize,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self::new(line + 1, character + 1, length, message, severity)
    }

    /// The synthetic diagnostic returned for empty requests
    pub fn no_code() -> Self {
        Self::unlocated(Self::NO_CODE_MESSAGE, Severity::Error)
    }

    /// 1-based line number
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based character column
    pub fn column(&self) -> usize {
        self.column
    }

    /// Number of characters covered (at least 1)
    pub fn length(&self) -> usize {
        self.length
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity level
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.line, self.column, self.severity, self.message
        )
    }
}
