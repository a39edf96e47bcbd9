//! Running external checking tools

use crate::types::{AnalyzerError, Diagnostic, Severity};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Longest stderr excerpt carried in a `ToolFailed` error
const STDERR_EXCERPT_CHARS: usize = 400;

/// Captured output of a finished tool
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl ToolOutput {
    /// Build the error for a tool that exited without usable output
    pub(crate) fn failure(&self, tool: &str) -> AnalyzerError {
        AnalyzerError::ToolFailed {
            tool: tool.to_string(),
            status: self.status.to_string(),
            stderr: excerpt(&self.stderr),
        }
    }

    /// Unlocated error for a tool that exited with a failure code and
    /// stderr none of the parsers understood.
    ///
    /// Returns `None` when the tool was killed by a signal or printed
    /// nothing, which leaves the caller to report a tool failure.
    pub(crate) fn unparsed_finding(&self) -> Option<Diagnostic> {
        self.status.code()?;
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        let message = lines
            .iter()
            .find(|line| line.to_ascii_lowercase().contains("error"))
            .or_else(|| lines.first())?;
        Some(Diagnostic::unlocated(excerpt(message), Severity::Error))
    }

    /// Fall back to [`unparsed_finding`](Self::unparsed_finding), then to a tool failure
    pub(crate) fn unparsed_or_failure(&self, tool: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        match self.unparsed_finding() {
            Some(finding) => {
                log::debug!("{} output not understood, reporting it unlocated", tool);
                Ok(vec![finding])
            }
            None => Err(self.failure(tool)),
        }
    }
}

/// A tool invocation
#[derive(Debug, Clone)]
pub(crate) struct Tool {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, OsString)>,
}

impl Tool {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub(crate) fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub(crate) fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Program name, for error messages
    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion and capture both output streams.
    ///
    /// The child is killed if the returned future is dropped before it
    /// completes.
    pub(crate) async fn run(&self) -> Result<ToolOutput, AnalyzerError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        log::debug!("Running {} {:?}", self.program, self.args);

        let output = command.output().await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AnalyzerError::ToolNotFound {
                    tool: self.program.clone(),
                }
            } else {
                AnalyzerError::Spawn {
                    tool: self.program.clone(),
                    source,
                }
            }
        })?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Trimmed tail of a stderr stream
fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - STDERR_EXCERPT_CHARS).collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output_with(code: i32, stderr: &str) -> ToolOutput {
        use std::os::unix::process::ExitStatusExt;
        ToolOutput {
            status: ExitStatus::from_raw(code << 8),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unparsed_finding_prefers_error_line() {
        let output = output_with(1, "# livelint.scratch\nwarning: noise\nfatal error: bad input\n");
        assert_eq!(
            output.unparsed_finding(),
            Some(Diagnostic::unlocated("fatal error: bad input", Severity::Error))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unparsed_finding_uses_first_line() {
        let output = output_with(2, "\n  something odd happened\nmore\n");
        let finding = output.unparsed_finding().unwrap();
        assert_eq!(finding.message(), "something odd happened");
        assert_eq!((finding.line(), finding.column(), finding.length()), (1, 1, 1));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_or_killed_tool_is_a_failure() {
        use std::os::unix::process::ExitStatusExt;
        assert!(output_with(1, "  \n# only a header\n").unparsed_finding().is_none());

        let killed = ToolOutput {
            status: ExitStatus::from_raw(9),
            stdout: String::new(),
            stderr: "error: partial".to_string(),
        };
        assert!(matches!(
            killed.unparsed_or_failure("g++"),
            Err(AnalyzerError::ToolFailed { .. })
        ));
    }

    #[test]
    fn test_excerpt_keeps_short_output() {
        assert_eq!(excerpt("  boom\n"), "boom");
    }

    #[test]
    fn test_excerpt_keeps_tail_of_long_output() {
        let long = format!("{}END", "x".repeat(1000));
        let short = excerpt(&long);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("END"));
        assert_eq!(short.chars().count(), STDERR_EXCERPT_CHARS + 3);
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let err = Tool::new("livelint-definitely-not-a-real-tool")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::ToolNotFound { .. }));
    }
}
