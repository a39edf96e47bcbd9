//! JSON output formatter

use crate::types::AnalysisResult;
use serde_json::json;

/// Format a result as a JSON document
pub fn format_json(path: &str, language: &str, result: &AnalysisResult) -> String {
    let value = match result {
        AnalysisResult::Ok {
            diagnostics,
            execution_time,
        } => json!({
            "file": path,
            "language": language,
            "diagnostics": diagnostics,
            "executionTimeMs": u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX),
        }),
        AnalysisResult::Error { message } => json!({
            "file": path,
            "language": language,
            "error": message,
        }),
    };
    serde_json::to_string_pretty(&value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize results: {}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Diagnostic, Severity};
    use std::time::Duration;

    #[test]
    fn test_format_json_with_diagnostics() {
        let result = AnalysisResult::ok(
            vec![Diagnostic::new(2, 4, 3, "undefined: fmt", Severity::Error)],
            Duration::from_millis(250),
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&format_json("main.go", "go", &result)).unwrap();

        assert_eq!(parsed["file"], "main.go");
        assert_eq!(parsed["executionTimeMs"], 250);
        assert_eq!(parsed["diagnostics"][0]["line"], 2);
        assert_eq!(parsed["diagnostics"][0]["severity"], "error");
    }

    #[test]
    fn test_format_json_saturates_huge_durations() {
        let result = AnalysisResult::ok(vec![], Duration::MAX);
        let parsed: serde_json::Value =
            serde_json::from_str(&format_json("main.py", "python", &result)).unwrap();
        assert_eq!(parsed["executionTimeMs"], u64::MAX);
    }

    #[test]
    fn test_format_json_error() {
        let result = AnalysisResult::error("Internal linter error: dart not found");
        let parsed: serde_json::Value =
            serde_json::from_str(&format_json("main.dart", "dart", &result)).unwrap();
        assert_eq!(parsed["error"], "Internal linter error: dart not found");
        assert!(parsed.get("diagnostics").is_none());
    }
}
