//! Language analyzers
//!
//! An [`Analyzer`] turns one complete source text into a list of
//! [`Diagnostic`]s. Each supported language has its own implementation that
//! drives the language's native tooling in a private scratch directory and
//! maps the tool's output onto the shared diagnostic model.
//!
//! Adding a language means adding a [`Language`] variant, an analyzer module
//! here, and a line in [`AnalyzerRegistry::from_config`]. Nothing else in
//! the pipeline changes.

pub mod cpp;
pub mod dart;
pub mod go;
mod mock;
pub mod position;
mod process;
pub mod python;
mod scratch;
pub mod typescript;

pub use cpp::CppAnalyzer;
pub use dart::DartAnalyzer;
pub use go::GoAnalyzer;
pub use mock::MockAnalyzer;
pub use python::PythonAnalyzer;
pub use scratch::ScratchDir;
pub use typescript::TypeScriptAnalyzer;

use crate::config::AnalysisConfig;
use crate::types::{AnalyzerError, Diagnostic, Language};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`Analyzer::analyze`]
pub type AnalyzeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Diagnostic>, AnalyzerError>> + Send + 'a>>;

/// Trait every language analyzer implements.
///
/// Implementations hold configuration only. Each call must be independent of
/// every other call so that the dispatcher can run them concurrently.
pub trait Analyzer: Send + Sync {
    /// The language this analyzer checks
    fn language(&self) -> Language;

    /// Analyze a complete compilation unit.
    ///
    /// Findings in the code are returned as diagnostics. `Err` is reserved
    /// for failures of the checking engine itself.
    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a>;
}

/// Shared analyzer handle
pub type SharedAnalyzer = Arc<dyn Analyzer>;

/// Lookup table from language to analyzer
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<Language, SharedAnalyzer>,
}

impl AnalyzerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry described by the analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut registry = Self::new();

        for language in Language::ALL {
            if config.disabled_languages.contains(&language) {
                continue;
            }
            if config.mock {
                registry.register(Arc::new(MockAnalyzer::new(language)));
                continue;
            }
            let analyzer: SharedAnalyzer = match language {
                Language::Typescript => Arc::new(TypeScriptAnalyzer::new(config.typescript.clone())),
                Language::Python => Arc::new(PythonAnalyzer::new(config.python.clone())),
                Language::Go => Arc::new(GoAnalyzer::new(config.go.clone())),
                Language::Dart => Arc::new(DartAnalyzer::new(config.dart.clone())),
                Language::Cpp => Arc::new(CppAnalyzer::new(config.cpp.clone())),
            };
            registry.register(analyzer);
        }

        registry
    }

    /// Add or replace the analyzer for its language
    pub fn register(&mut self, analyzer: SharedAnalyzer) {
        self.analyzers.insert(analyzer.language(), analyzer);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, analyzer: SharedAnalyzer) -> Self {
        self.register(analyzer);
        self
    }

    /// Get the analyzer for a language
    pub fn get(&self, language: Language) -> Option<SharedAnalyzer> {
        self.analyzers.get(&language).cloned()
    }

    /// Languages with a registered analyzer, sorted
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.analyzers.keys().copied().collect();
        languages.sort();
        languages
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
