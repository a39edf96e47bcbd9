//! Canned analyzer for testing mode

use super::{AnalyzeFuture, Analyzer};
use crate::types::{Diagnostic, Language, Severity};

/// Returns one fixed warning for any input, without running a tool
#[derive(Debug, Clone, Copy)]
pub struct MockAnalyzer {
    language: Language,
}

impl MockAnalyzer {
    /// Create a mock analyzer answering for `language`
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl Analyzer for MockAnalyzer {
    fn language(&self) -> Language {
        self.language
    }

    fn analyze<'a>(&'a self, _code: &'a str) -> AnalyzeFuture<'a> {
        let diagnostic = Diagnostic::new(
            1,
            1,
            10,
            format!("Mock error for {} (testing mode)", self.language),
            Severity::Warning,
        );
        Box::pin(async move { Ok(vec![diagnostic]) })
    }
}
