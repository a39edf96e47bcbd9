#![cfg(feature = "cli")]

//! End-to-end tests for the livelint CLI binary

use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the compiled binary
fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .unwrap()
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    path.push("livelint");
    path
}

/// Run livelint in `dir` and return (exit_code, stdout, stderr)
fn run_livelint(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(binary_path())
        .current_dir(dir)
        .args(args)
        .arg("--no-color")
        .env_remove("LIVELINT_MOCK_ANALYZERS")
        .env_remove("LIVELINT_ANALYSIS_TIMEOUT_MS")
        .output()
        .expect("Failed to execute livelint binary");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _stderr) = run_livelint(dir.path(), &["--version"]);
    assert_eq!(code, 0, "--version should exit 0");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_languages() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _stderr) = run_livelint(dir.path(), &["languages"]);
    assert_eq!(code, 0);
    for id in ["typescript", "python", "go", "dart", "cpp"] {
        assert!(stdout.contains(id), "missing {} in:\n{}", id, stdout);
    }
}

#[test]
fn test_cli_languages_honors_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("livelint.toml"),
        "[analysis]\ndisabled_languages = [\"dart\"]\n",
    )
    .unwrap();

    let (code, stdout, _stderr) = run_livelint(dir.path(), &["languages"]);
    assert_eq!(code, 0);
    let dart = stdout.lines().find(|l| l.starts_with("dart")).unwrap();
    assert!(dart.contains("disabled"), "{}", dart);
}

#[test]
fn test_cli_samples() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _stderr) = run_livelint(dir.path(), &["samples", "python"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("def greet(name)"));

    let (code, _stdout, stderr) = run_livelint(dir.path(), &["samples", "cobol"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unsupported language: cobol"));
}

#[test]
fn test_cli_analyze_mock() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();

    let (code, stdout, _stderr) = run_livelint(dir.path(), &["analyze", "main.py", "--mock"]);
    assert_eq!(code, 0, "warnings alone should exit 0:\n{}", stdout);
    assert!(stdout.contains("main.py:1:1: warning: Mock error for python (testing mode)"));
    assert!(stdout.contains("0 error(s), 1 warning(s)"));
}

#[test]
fn test_cli_analyze_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.go"), "package main\n").unwrap();

    let (code, stdout, _stderr) = run_livelint(
        dir.path(),
        &["analyze", "main.go", "--mock", "--output-format", "json"],
    );
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["language"], "go");
    assert_eq!(value["diagnostics"][0]["severity"], "warning");
}

#[test]
fn test_cli_analyze_unsupported_language() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.cbl"), "DISPLAY 'HI'.\n").unwrap();

    let (code, stdout, _stderr) = run_livelint(
        dir.path(),
        &["analyze", "hello.cbl", "--language", "cobol", "--mock"],
    );
    assert_eq!(code, 1);
    assert!(stdout.contains("Unsupported language: cobol"), "{}", stdout);
}

#[test]
fn test_cli_analyze_unknown_extension_needs_language() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

    let (code, _stdout, stderr) = run_livelint(dir.path(), &["analyze", "notes.txt", "--mock"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--language"), "{}", stderr);
}

#[test]
fn test_cli_analyze_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.ts"), "  \n").unwrap();

    let (code, stdout, _stderr) = run_livelint(dir.path(), &["analyze", "empty.ts", "--mock"]);
    assert_eq!(code, 1, "the no-code diagnostic is an error");
    assert!(stdout.contains("No code provided"));
}

#[test]
fn test_cli_analyze_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _stdout, stderr) = run_livelint(dir.path(), &["analyze", "absent.py", "--mock"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("absent.py"));
}

#[cfg(feature = "server")]
#[tokio::test]
async fn test_cli_watch_once_against_live_server() {
    use livelint::config::{AnalysisConfig, RateLimitConfig};
    use livelint::server::{AppState, StaticTokenVerifier, serve};
    use std::sync::Arc;
    use std::time::Duration;

    let dispatcher = livelint::Dispatcher::from_config(&AnalysisConfig {
        mock: true,
        ..Default::default()
    });
    let verifier = Arc::new(StaticTokenVerifier::default().with_token("dev-token", "developer"));
    let state = AppState::new(dispatcher, verifier, &RateLimitConfig::default()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state, std::future::pending()));

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.dart"), "void main() {}\n").unwrap();

    let server = format!("ws://{}", addr);
    let child = tokio::process::Command::new(binary_path())
        .current_dir(dir.path())
        .args([
            "watch",
            "main.dart",
            "--server",
            server.as_str(),
            "--token",
            "dev-token",
            "--quiet-period-ms",
            "10",
            "--once",
            "--no-color",
        ])
        .kill_on_drop(true)
        .output();
    let output = tokio::time::timeout(Duration::from_secs(20), child)
        .await
        .expect("watch --once should exit after the first result")
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", stdout);
    assert!(stdout.contains("Mock error for dart (testing mode)"), "{}", stdout);
}
