//! Go analyzer: `gofmt -e` for syntax, then `go vet` for types and vet checks

use super::position::{byte_to_char_column, line_text, token_length_at};
use super::process::Tool;
use super::{AnalyzeFuture, Analyzer, ScratchDir};
use crate::config::GoConfig;
use crate::types::{AnalyzerError, Diagnostic, Language, Severity};
use regex::Regex;
use std::sync::LazyLock;

const GO_MOD: &str = "module livelint.scratch\n\ngo 1.21\n";

static FINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(vet: )?(?:\./)?main\.go:(\d+):(\d+): (.+)$").expect("valid regex")
});

/// Which pass produced a Go finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoFindingSource {
    /// Parser error reported by gofmt
    Syntax,
    /// Type-check failure reported by go vet (`vet:` prefix)
    TypeCheck,
    /// Analyzer finding from go vet
    Vet,
}

/// Map a finding source onto a severity
pub fn source_severity(source: GoFindingSource) -> Severity {
    match source {
        GoFindingSource::Syntax | GoFindingSource::TypeCheck => Severity::Error,
        GoFindingSource::Vet => Severity::Warning,
    }
}

/// Analyzer for Go
#[derive(Debug, Clone)]
pub struct GoAnalyzer {
    config: GoConfig,
}

impl GoAnalyzer {
    /// Create a new Go analyzer
    pub fn new(config: GoConfig) -> Self {
        Self { config }
    }

    async fn run(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let scratch = ScratchDir::new("go")?;
        scratch.write("go.mod", GO_MOD).await?;
        scratch.write("main.go", code).await?;

        let gofmt = Tool::new(&self.config.gofmt)
            .args(["-e", "-l", "main.go"])
            .current_dir(scratch.path());
        let output = gofmt.run().await?;
        let syntax = parse_output(code, &output.stderr, Some(GoFindingSource::Syntax));
        if !syntax.is_empty() {
            return Ok(syntax);
        }
        if !output.status.success() {
            return output.unparsed_or_failure(gofmt.program());
        }

        let vet = Tool::new(&self.config.go)
            .args(["vet", "."])
            .current_dir(scratch.path())
            .env("GOFLAGS", "-mod=mod")
            .env("GOWORK", "off")
            .env("GOTOOLCHAIN", "local");
        let output = vet.run().await?;
        let findings = parse_output(code, &output.stderr, None);
        if findings.is_empty() && !output.status.success() {
            return output.unparsed_or_failure(vet.program());
        }

        Ok(findings)
    }
}

impl Analyzer for GoAnalyzer {
    fn language(&self) -> Language {
        Language::Go
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(self.run(code))
    }
}

/// Parse gofmt/go vet output.
///
/// With `forced` set every finding gets that source; otherwise the `vet:`
/// prefix decides between type-check errors and vet findings.
pub fn parse_output(
    code: &str,
    output: &str,
    forced: Option<GoFindingSource>,
) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|raw| {
            let caps = FINDING.captures(raw.trim_end())?;
            let line: usize = caps[2].parse().ok()?;
            let byte_column: usize = caps[3].parse().ok()?;
            let source = forced.unwrap_or(if caps.get(1).is_some() {
                GoFindingSource::TypeCheck
            } else {
                GoFindingSource::Vet
            });

            let text = line_text(code, line).unwrap_or("");
            let column = byte_to_char_column(text, byte_column);
            let length = token_length_at(text, column);
            Some(Diagnostic::new(
                line,
                column,
                length,
                caps[4].to_string(),
                source_severity(source),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "package main\n\nfunc main() {\n    fmt.Println(\"Hello\")\n}\n";

    #[test]
    fn test_parse_gofmt_syntax_error() {
        let code = "package main\n\nfunc main {\n}\n";
        let stderr = "main.go:3:11: expected '(', found '{'\n";
        let diagnostics = parse_output(code, stderr, Some(GoFindingSource::Syntax));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!((diagnostics[0].line(), diagnostics[0].column()), (3, 11));
        assert_eq!(diagnostics[0].severity(), Severity::Error);
    }

    #[test]
    fn test_parse_vet_type_error() {
        let stderr = "# livelint.scratch\n# [livelint.scratch]\nvet: ./main.go:4:5: undefined: fmt\n";
        let diagnostics = parse_output(CODE, stderr, None);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message(), "undefined: fmt");
        assert_eq!(diagnostics[0].length(), 3);
        assert_eq!(diagnostics[0].severity(), Severity::Error);
    }

    #[test]
    fn test_parse_vet_finding_is_warning() {
        let stderr = "# livelint.scratch\n./main.go:4:5: fmt.Println call has possible Printf formatting directive %d\n";
        let diagnostics = parse_output(CODE, stderr, None);
        assert_eq!(diagnostics[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert!(parse_output(CODE, "# livelint.scratch\nok\n", None).is_empty());
    }
}
