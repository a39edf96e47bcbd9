//! C++ analyzer backed by a GCC-compatible compiler in `-fsyntax-only` mode

use super::position::{byte_to_char_column, line_text, token_length_at};
use super::process::Tool;
use super::{AnalyzeFuture, Analyzer, ScratchDir};
use crate::config::CppConfig;
use crate::types::{AnalyzerError, Diagnostic, Language, Severity};
use regex::Regex;
use std::sync::LazyLock;

static FINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*[/\\])?main\.cpp:(\d+)(?::(\d+))?: (fatal error|error|warning|note): (.*)$")
        .expect("valid regex")
});

/// Errors whose primary location is another file, usually a system header
static FOREIGN_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S[^:]*:\d+:(?:\d+:)? (fatal error|error): (.*)$").expect("valid regex")
});

/// `main.cpp` locations in instantiation and include chains
static CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|from )(?:\S*[/\\])?main\.cpp:(\d+)(?::(\d+))?[:,]").expect("valid regex")
});

/// Analyzer for C++
#[derive(Debug, Clone)]
pub struct CppAnalyzer {
    config: CppConfig,
}

impl CppAnalyzer {
    /// Create a new C++ analyzer
    pub fn new(config: CppConfig) -> Self {
        Self { config }
    }

    async fn run(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let scratch = ScratchDir::new("cpp")?;
        scratch.write("main.cpp", code).await?;

        let tool = Tool::new(&self.config.compiler)
            .arg("-fsyntax-only")
            .arg(format!("-std={}", self.config.std))
            .args(["-Wall", "-Wextra", "-fdiagnostics-color=never"])
            .args(self.config.extra_args.iter().map(String::as_str))
            .arg("main.cpp")
            .current_dir(scratch.path());
        let output = tool.run().await?;

        let diagnostics = parse_output(code, &output.stderr);
        if diagnostics.is_empty() && !output.status.success() {
            return output.unparsed_or_failure(tool.program());
        }

        Ok(diagnostics)
    }
}

impl Analyzer for CppAnalyzer {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(self.run(code))
    }
}

/// Map a compiler diagnostic kind onto a severity
pub fn kind_severity(kind: &str) -> Severity {
    match kind {
        "error" | "fatal error" => Severity::Error,
        "note" => Severity::Info,
        _ => Severity::Warning,
    }
}

/// Position of a 1-based line and optional byte column, with the token length there
fn locate(code: &str, line: usize, byte_column: Option<usize>) -> (usize, usize) {
    let text = line_text(code, line).unwrap_or("");
    match byte_column {
        Some(byte_column) => {
            let column = byte_to_char_column(text, byte_column);
            (column, token_length_at(text, column))
        }
        None => (1, 1),
    }
}

/// Parse compiler stderr into diagnostics.
///
/// `main.cpp:LINE:COL: KIND: MESSAGE` lines map directly. Errors located in
/// other files are attributed to the latest `main.cpp` location seen in an
/// instantiation or include chain ("required from here"), or reported
/// unlocated when there is none. Notes and warnings from other files are
/// dropped.
pub fn parse_output(code: &str, stderr: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut context: Option<(usize, Option<usize>)> = None;

    for raw in stderr.lines().map(str::trim_end) {
        if let Some(caps) = FINDING.captures(raw) {
            let Ok(line) = caps[1].parse::<usize>() else {
                continue;
            };
            let byte_column = caps.get(2).and_then(|m| m.as_str().parse().ok());
            let (column, length) = locate(code, line, byte_column);
            diagnostics.push(Diagnostic::new(
                line,
                column,
                length,
                caps[4].to_string(),
                kind_severity(&caps[3]),
            ));
        } else if let Some(caps) = FOREIGN_ERROR.captures(raw) {
            let message = caps[2].to_string();
            let severity = kind_severity(&caps[1]);
            diagnostics.push(match context {
                Some((line, byte_column)) => {
                    let (column, length) = locate(code, line, byte_column);
                    Diagnostic::new(line, column, length, message, severity)
                }
                None => Diagnostic::unlocated(message, severity),
            });
        } else if let Some(caps) = CONTEXT.captures(raw)
            && let Ok(line) = caps[1].parse::<usize>()
        {
            context = Some((line, caps.get(2).and_then(|m| m.as_str().parse().ok())));
        }
    }

    diagnostics
}
