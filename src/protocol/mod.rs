//! JSON messages exchanged over the live session socket
//!
//! Client to server:
//!
//! ```json
//! { "action": "analyze", "language": "python", "code": "print(1)", "seq": 7 }
//! ```
//!
//! Server to client:
//!
//! ```json
//! { "type": "analysis_result", "errors": [], "executionTimeMs": 42, "seq": 7 }
//! { "type": "error", "message": "Unsupported language: cobol", "seq": 7 }
//! ```
//!
//! `seq` is optional in both directions. A server echoes whatever the
//! request carried; clients that omit it get responses without it.

use crate::types::{AnalysisResult, AnalyzeRequest, Diagnostic};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The only action a client may request
pub const ANALYZE_ACTION: &str = "analyze";

/// Frame sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Requested action; only `analyze` is understood
    #[serde(default)]
    pub action: String,
    /// Language identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Full source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Client-assigned sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Reason a well-formed frame cannot become an [`AnalyzeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestRejection {
    /// `action` is not `analyze`
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    /// `language` absent or empty
    #[error("Missing language field")]
    MissingLanguage,
}

impl ClientMessage {
    /// Build an analyze frame
    pub fn analyze(language: impl Into<String>, code: impl Into<String>, seq: Option<u64>) -> Self {
        Self {
            action: ANALYZE_ACTION.to_string(),
            language: Some(language.into()),
            code: Some(code.into()),
            seq,
        }
    }

    /// Parse a text frame
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize to a text frame
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Validate the frame into a request.
    ///
    /// A missing `code` is treated as empty so the dispatcher answers with
    /// its "No code provided" diagnostic.
    pub fn into_request(self) -> Result<AnalyzeRequest, RequestRejection> {
        if self.action != ANALYZE_ACTION {
            return Err(RequestRejection::UnknownAction(self.action));
        }
        let language = match self.language {
            Some(language) if !language.is_empty() => language,
            _ => return Err(RequestRejection::MissingLanguage),
        };
        Ok(AnalyzeRequest::new(language, self.code.unwrap_or_default()))
    }
}

/// Frame sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Analyzer ran
    AnalysisResult {
        /// Diagnostics in analyzer order
        #[serde(default)]
        errors: Vec<Diagnostic>,
        /// Analyzer wall-clock time
        #[serde(rename = "executionTimeMs", alias = "executionTime", default)]
        execution_time_ms: u64,
        /// Echo of the request's sequence number
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
    /// Request could not be analyzed
    Error {
        /// Human-readable description
        message: String,
        /// Echo of the request's sequence number
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
}

impl ServerMessage {
    /// Convert a dispatcher result into a frame
    pub fn from_result(result: AnalysisResult, seq: Option<u64>) -> Self {
        match result {
            AnalysisResult::Ok {
                diagnostics,
                execution_time,
            } => ServerMessage::AnalysisResult {
                errors: diagnostics,
                execution_time_ms: u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX),
                seq,
            },
            AnalysisResult::Error { message } => ServerMessage::Error { message, seq },
        }
    }

    /// Build an error frame
    pub fn error(message: impl Into<String>, seq: Option<u64>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            seq,
        }
    }

    /// Sequence number echoed by the server, if any
    pub fn seq(&self) -> Option<u64> {
        match self {
            ServerMessage::AnalysisResult { seq, .. } | ServerMessage::Error { seq, .. } => *seq,
        }
    }

    /// Convert back into a result on the client side
    pub fn into_result(self) -> AnalysisResult {
        match self {
            ServerMessage::AnalysisResult {
                errors,
                execution_time_ms,
                ..
            } => AnalysisResult::ok(errors, Duration::from_millis(execution_time_ms)),
            ServerMessage::Error { message, .. } => AnalysisResult::error(message),
        }
    }

    /// Parse a text frame
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize to a text frame
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_client_message_without_seq() {
        let msg = ClientMessage::analyze("python", "print(1)", None);
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "analyze", "language": "python", "code": "print(1)"})
        );
    }

    #[test]
    fn test_into_request() {
        let msg = ClientMessage::parse(r#"{"action":"analyze","language":"go","code":"x","seq":3}"#)
            .unwrap();
        assert_eq!(msg.seq, Some(3));
        assert_eq!(msg.into_request().unwrap(), AnalyzeRequest::new("go", "x"));
    }

    #[test]
    fn test_unknown_action() {
        let msg = ClientMessage::parse(r#"{"action":"format","language":"go"}"#).unwrap();
        let err = msg.into_request().unwrap_err();
        assert_eq!(err.to_string(), "Unknown action: format");
    }

    #[test]
    fn test_missing_language() {
        for text in [
            r#"{"action":"analyze","code":"x"}"#,
            r#"{"action":"analyze","language":"","code":"x"}"#,
        ] {
            let err = ClientMessage::parse(text).unwrap().into_request().unwrap_err();
            assert_eq!(err, RequestRejection::MissingLanguage);
            assert_eq!(err.to_string(), "Missing language field");
        }
    }

    #[test]
    fn test_missing_code_is_empty() {
        let msg = ClientMessage::parse(r#"{"action":"analyze","language":"dart"}"#).unwrap();
        assert_eq!(msg.into_request().unwrap().code, "");
    }

    #[test]
    fn test_unparseable_frames() {
        assert!(ClientMessage::parse("not json").is_err());
        assert!(ClientMessage::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_server_result_shape() {
        let result = AnalysisResult::ok(
            vec![Diagnostic::new(1, 19, 7, "Type mismatch", Severity::Error)],
            Duration::from_millis(85),
        );
        let msg = ServerMessage::from_result(result, Some(4));
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "analysis_result",
                "errors": [{
                    "line": 1,
                    "column": 19,
                    "message": "Type mismatch",
                    "severity": "error",
                    "length": 7
                }],
                "executionTimeMs": 85,
                "seq": 4
            })
        );
    }

    #[test]
    fn test_server_error_shape() {
        let msg = ServerMessage::error("Missing language field", None);
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "Missing language field"}));
    }

    #[test]
    fn test_parse_legacy_result() {
        let msg = ServerMessage::parse(
            r#"{"type":"analysis_result","errors":[{"line":0,"column":2,"message":"m","severity":"info"}],"executionTime":12}"#,
        )
        .unwrap();
        assert_eq!(msg.seq(), None);

        let result = msg.into_result();
        assert_eq!(result.execution_time_ms(), Some(12));
        let diag = &result.diagnostics()[0];
        assert_eq!((diag.line(), diag.column(), diag.length()), (1, 2, 1));
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        assert!(ServerMessage::parse(r#"{"type":"pong"}"#).is_err());
    }
}
