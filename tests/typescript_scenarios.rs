//! Scenarios against a real TypeScript toolchain
//!
//! These need `node` on PATH with the `typescript` package resolvable, so
//! they are ignored by default. Run with `cargo test -- --ignored`.

use livelint::config::AnalysisConfig;
use livelint::{AnalysisResult, AnalyzeRequest, Dispatcher, Severity};

async fn analyze_typescript(code: &str) -> AnalysisResult {
    Dispatcher::from_config(&AnalysisConfig::default())
        .dispatch(&AnalyzeRequest::new("typescript", code))
        .await
}

#[tokio::test]
#[ignore = "needs node and typescript"]
async fn test_assignability_mismatch() {
    let result = analyze_typescript("const x: number = 'hello';").await;
    assert!(result.is_ok(), "{:?}", result);

    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    let diag = &diagnostics[0];
    // the span covers the string literal, not the declared name
    assert_eq!((diag.line(), diag.column(), diag.length()), (1, 19, 7));
    assert_eq!(diag.severity(), Severity::Error);
    assert!(diag.message().contains("not assignable"));
}

#[tokio::test]
#[ignore = "needs node and typescript"]
async fn test_clean_code_has_no_diagnostics() {
    let result = analyze_typescript("const x: number = 42;\nconsole.log(x);").await;
    assert_eq!(result.diagnostics(), &[]);
    assert!(result.is_ok());
}

#[tokio::test]
#[ignore = "needs node and typescript"]
async fn test_malformed_expression_is_located() {
    let result = analyze_typescript("const x: number = ;").await;
    let diagnostics = result.diagnostics();

    assert!(!diagnostics.is_empty(), "{:?}", result);
    assert!(diagnostics.iter().all(|d| d.severity() == Severity::Error));
    assert!(diagnostics.iter().any(|d| d.column() > 1));
}
