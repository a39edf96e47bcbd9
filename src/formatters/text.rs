//! Plain text output formatter

use crate::analyzers::position::line_text;
use crate::types::{AnalysisResult, Diagnostic};
use std::fmt::Write;

/// Format a result as `path:line:column: severity: message` lines
pub fn format_text(path: &str, result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Ok { diagnostics, .. } => diagnostics
            .iter()
            .map(|d| format!("{}\n", header(path, d)))
            .collect(),
        AnalysisResult::Error { message } => format!("{}: error: {}\n", path, message),
    }
}

/// Like [`format_text`], with the offending source line and a caret underline
pub fn format_text_with_context(path: &str, source: &str, result: &AnalysisResult) -> String {
    let AnalysisResult::Ok { diagnostics, .. } = result else {
        return format_text(path, result);
    };

    let gutter = diagnostics
        .iter()
        .map(|d| d.line().to_string().len())
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(out, "{}", header(path, diagnostic));
        if let Some(text) = line_text(source, diagnostic.line()) {
            let text = text.replace('\t', " ");
            let available = text.chars().count().saturating_sub(diagnostic.column() - 1);
            let width = diagnostic.length().min(available.max(1));
            let _ = writeln!(out, "{:>gutter$} | {}", diagnostic.line(), text);
            let _ = writeln!(
                out,
                "{:>gutter$} | {}{}",
                "",
                " ".repeat(diagnostic.column() - 1),
                "^".repeat(width)
            );
        }
    }
    out
}

fn header(path: &str, diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{}:{}: {}: {}",
        path,
        diagnostic.line(),
        diagnostic.column(),
        diagnostic.severity(),
        diagnostic.message()
    )
}
