//! Error types for livelint

use std::time::Duration;

/// Main error type for livelint operations
#[derive(Debug, thiserror::Error)]
pub enum LivelintError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Session token rejected
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Metrics registry setup failed
    #[cfg(feature = "server")]
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for livelint operations
pub type Result<T> = std::result::Result<T, LivelintError>;

/// Failure of the checking engine itself, as opposed to a finding in the code
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The external tool is not installed or not on PATH
    #[error("{tool} not found (is it installed and on PATH?)")]
    ToolNotFound {
        /// Program name
        tool: String,
    },

    /// The tool could not be started
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Program name
        tool: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The tool exited abnormally without producing findings
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        /// Program name
        tool: String,
        /// Exit status description
        status: String,
        /// Trimmed stderr excerpt
        stderr: String,
    },

    /// The tool produced output that could not be interpreted
    #[error("unexpected output from {tool}: {detail}")]
    MalformedOutput {
        /// Program name
        tool: String,
        /// What went wrong
        detail: String,
    },

    /// The scratch directory could not be prepared
    #[error("scratch setup failed: {0}")]
    Scratch(#[from] std::io::Error),

    /// The analysis did not finish in time
    #[error("analysis timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Token verification failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No token was presented
    #[error("missing token")]
    MissingToken,

    /// The token was presented and rejected
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The auth collaborator could not be reached or misbehaved
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_error_messages() {
        let err = AnalyzerError::ToolNotFound {
            tool: "node".to_string(),
        };
        assert_eq!(err.to_string(), "node not found (is it installed and on PATH?)");

        let err = AnalyzerError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "analysis timed out after 1500ms");
    }

    #[test]
    fn test_auth_error_converts() {
        let err: LivelintError = AuthError::MissingToken.into();
        assert_eq!(err.to_string(), "Authentication failed: missing token");
    }
}
