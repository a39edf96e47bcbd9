//! Dart analyzer backed by `dart analyze --format=machine`

use super::position::{line_text, utf16_span_chars, utf16_to_char_column};
use super::process::Tool;
use super::{AnalyzeFuture, Analyzer, ScratchDir};
use crate::config::DartConfig;
use crate::types::{AnalyzerError, Diagnostic, Language, Severity};

/// Analyzer for Dart
#[derive(Debug, Clone)]
pub struct DartAnalyzer {
    config: DartConfig,
}

impl DartAnalyzer {
    /// Create a new Dart analyzer
    pub fn new(config: DartConfig) -> Self {
        Self { config }
    }

    async fn run(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let scratch = ScratchDir::new("dart")?;
        scratch.write("main.dart", code).await?;

        let tool = Tool::new(&self.config.dart)
            .args(["analyze", "--format=machine", "main.dart"])
            .current_dir(scratch.path())
            .env("DART_SUPPRESS_ANALYTICS", "true");
        let output = tool.run().await?;

        // machine output has gone to either stream across SDK releases
        let mut diagnostics = parse_output(code, &output.stdout);
        diagnostics.extend(parse_output(code, &output.stderr));

        // exit code is non-zero whenever issues were found
        if diagnostics.is_empty() && !output.status.success() {
            return output.unparsed_or_failure(tool.program());
        }

        Ok(diagnostics)
    }
}

impl Analyzer for DartAnalyzer {
    fn language(&self) -> Language {
        Language::Dart
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(self.run(code))
    }
}

/// Map a Dart analyzer severity onto a severity
pub fn tool_severity(severity: &str) -> Severity {
    match severity {
        "ERROR" => Severity::Error,
        "WARNING" => Severity::Warning,
        "INFO" => Severity::Info,
        _ => Severity::Warning,
    }
}

/// Split a machine-format line on unescaped `|`
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse `SEVERITY|TYPE|CODE|FILE|LINE|COLUMN|LENGTH|MESSAGE` lines
pub fn parse_output(code: &str, output: &str) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|raw| {
            let fields = split_fields(raw.trim_end());
            if fields.len() < 8 {
                return None;
            }
            let line: usize = fields[4].parse().ok()?;
            let utf16_column: usize = fields[5].parse().ok()?;
            let utf16_length: usize = fields[6].parse().unwrap_or(1);
            let (column, length) = match line_text(code, line) {
                Some(text) => (
                    utf16_to_char_column(text, utf16_column),
                    utf16_span_chars(text, utf16_column.saturating_sub(1), utf16_length),
                ),
                None => (utf16_column, utf16_length),
            };

            Some(Diagnostic::new(
                line,
                column,
                length,
                fields[7..].join("|"),
                tool_severity(&fields[0]),
            ))
        })
        .collect()
}
