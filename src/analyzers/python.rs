//! Python analyzer: compile check plus optional pyflakes pass

use super::position::token_length_in;
use super::process::Tool;
use super::{AnalyzeFuture, Analyzer, ScratchDir};
use crate::config::PythonConfig;
use crate::types::{AnalyzerError, Diagnostic, Language, Severity};
use serde::Deserialize;

/// Python driver. Emits a JSON list of findings with 1-based character
/// columns. pyflakes runs only when the module compiled and is importable.
const CHECK_SCRIPT: &str = r#"
import ast
import json
import sys
import warnings

path = sys.argv[1]
run_pyflakes = sys.argv[2] == "1"
with open(path, encoding="utf-8") as handle:
    source = handle.read()
lines = source.splitlines()
findings = []


def char_column(lineno, byte_col):
    if lineno is None or not (1 <= lineno <= len(lines)):
        return byte_col + 1
    prefix = lines[lineno - 1].encode("utf-8")[:byte_col]
    return len(prefix.decode("utf-8", errors="ignore")) + 1


def record(kind, line, column, end_line, end_column, message):
    findings.append({
        "kind": kind,
        "line": line,
        "column": column,
        "end_line": end_line,
        "end_column": end_column,
        "message": message,
    })


tree = None
with warnings.catch_warnings(record=True) as caught:
    warnings.simplefilter("always")
    try:
        parsed = ast.parse(source, filename=path)
        compile(parsed, path, "exec", dont_inherit=True)
        tree = parsed
    except SyntaxError as exc:
        record(type(exc).__name__, exc.lineno, exc.offset,
               getattr(exc, "end_lineno", None), getattr(exc, "end_offset", None), exc.msg)
    except ValueError as exc:
        record("ValueError", None, None, None, None, str(exc))
    for item in caught:
        if item.filename == path:
            record(item.category.__name__, item.lineno, None, None, None, str(item.message))

if tree is not None and run_pyflakes:
    try:
        from pyflakes import checker
    except ImportError:
        checker = None
    if checker is not None:
        for message in checker.Checker(tree, filename=path).messages:
            record(type(message).__name__, message.lineno,
                   char_column(message.lineno, message.col), None, None,
                   message.message % message.message_args)

print(json.dumps(findings))
"#;

const TOOL: &str = "python";

/// Positions are signed: CPython reports `-1` or `0` for unknown offsets.
#[derive(Debug, Deserialize)]
struct PyFinding {
    kind: String,
    line: Option<i64>,
    column: Option<i64>,
    end_line: Option<i64>,
    end_column: Option<i64>,
    message: String,
}

fn positive(value: Option<i64>) -> Option<usize> {
    value.filter(|v| *v > 0).and_then(|v| usize::try_from(v).ok())
}

/// Analyzer for Python 3
#[derive(Debug, Clone)]
pub struct PythonAnalyzer {
    config: PythonConfig,
}

impl PythonAnalyzer {
    /// Create a new Python analyzer
    pub fn new(config: PythonConfig) -> Self {
        Self { config }
    }

    async fn run(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let scratch = ScratchDir::new("py")?;
        let script = scratch.write("check.py", CHECK_SCRIPT).await?;
        let source = scratch.write("main.py", code).await?;

        let tool = Tool::new(&self.config.python)
            .arg(script)
            .arg(source)
            .arg(if self.config.pyflakes { "1" } else { "0" })
            .current_dir(scratch.path());

        let output = tool.run().await?;
        if !output.status.success() {
            return Err(output.failure(tool.program()));
        }

        parse_output(code, &output.stdout)
    }
}

impl Analyzer for PythonAnalyzer {
    fn language(&self) -> Language {
        Language::Python
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(self.run(code))
    }
}

/// Map a Python exception, warning or pyflakes message class onto a severity
pub fn kind_severity(kind: &str) -> Severity {
    match kind {
        "SyntaxError" | "IndentationError" | "TabError" | "ValueError" => Severity::Error,
        "UndefinedName" | "UndefinedLocal" | "UndefinedExport" => Severity::Error,
        _ => Severity::Warning,
    }
}

/// Convert the driver's JSON output into diagnostics
pub fn parse_output(code: &str, stdout: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
    let raw: Vec<PyFinding> =
        serde_json::from_str(stdout.trim()).map_err(|e| AnalyzerError::MalformedOutput {
            tool: TOOL.to_string(),
            detail: e.to_string(),
        })?;

    Ok(raw
        .into_iter()
        .map(|f| {
            let severity = kind_severity(&f.kind);
            let Some(line) = positive(f.line) else {
                return Diagnostic::unlocated(f.message, severity);
            };
            let column = positive(f.column).unwrap_or(1);
            let length = match (positive(f.end_line), positive(f.end_column)) {
                (Some(end_line), Some(end_column)) if end_line == line && end_column > column => {
                    end_column - column
                }
                _ => token_length_in(code, line, column),
            };
            Diagnostic::new(line, column, length, f.message, severity)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_severity() {
        assert_eq!(kind_severity("SyntaxError"), Severity::Error);
        assert_eq!(kind_severity("IndentationError"), Severity::Error);
        assert_eq!(kind_severity("UndefinedName"), Severity::Error);
        assert_eq!(kind_severity("UnusedImport"), Severity::Warning);
        assert_eq!(kind_severity("SyntaxWarning"), Severity::Warning);
    }

    #[test]
    fn test_parse_syntax_error() {
        let code = "def greet(name)\n    print(name)";
        let stdout = r#"[{"kind":"SyntaxError","line":1,"column":16,"end_line":1,"end_column":16,"message":"expected ':'"}]"#;
        let diagnostics = parse_output(code, stdout).unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line(), 1);
        assert_eq!(diagnostics[0].column(), 16);
        assert_eq!(diagnostics[0].length(), 1);
        assert_eq!(diagnostics[0].severity(), Severity::Error);
    }

    #[test]
    fn test_parse_pyflakes_message_uses_token_length() {
        let code = "import os\nprint(undefined_thing)";
        let stdout = r#"[
            {"kind":"UnusedImport","line":1,"column":1,"end_line":null,"end_column":null,"message":"'os' imported but unused"},
            {"kind":"UndefinedName","line":2,"column":7,"end_line":null,"end_column":null,"message":"undefined name 'undefined_thing'"}
        ]"#;
        let diagnostics = parse_output(code, stdout).unwrap();

        assert_eq!(diagnostics[0].severity(), Severity::Warning);
        assert_eq!(diagnostics[0].length(), 6);
        assert_eq!(diagnostics[1].severity(), Severity::Error);
        assert_eq!(diagnostics[1].length(), "undefined_thing".len());
    }

    #[test]
    fn test_parse_negative_offsets() {
        let code = "x = (";
        let stdout = r#"[{"kind":"SyntaxError","line":1,"column":5,"end_line":1,"end_column":-1,"message":"'(' was never closed"}]"#;
        let diagnostics = parse_output(code, stdout).unwrap();
        assert_eq!((diagnostics[0].column(), diagnostics[0].length()), (5, 1));
    }

    #[test]
    fn test_parse_unlocated() {
        let stdout = r#"[{"kind":"ValueError","line":null,"column":null,"end_line":null,"end_column":null,"message":"source code string cannot contain null bytes"}]"#;
        let diagnostics = parse_output("", stdout).unwrap();
        assert_eq!((diagnostics[0].line(), diagnostics[0].column()), (1, 1));
        assert_eq!(diagnostics[0].severity(), Severity::Error);
    }
}
