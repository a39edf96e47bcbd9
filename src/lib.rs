//! # livelint
//!
//! Near-real-time static analysis for code typed into an editor.
//!
//! The pipeline has four parts:
//!
//! - [`analyzers`]: one [`Analyzer`] per language (TypeScript, Python, Go,
//!   Dart, C++) that drives the language's own tooling and normalizes its
//!   output into [`Diagnostic`]s.
//! - [`dispatch`]: the [`Dispatcher`] validates a request, picks the analyzer,
//!   times it, and turns every failure into an [`AnalysisResult`].
//! - [`server`] (feature `server`): an HTTP service with a token-authenticated
//!   WebSocket endpoint speaking the [`protocol`].
//! - [`client`] (feature `client`): a [`LiveSession`](client::LiveSession)
//!   plus an [`EditDebouncer`](client::EditDebouncer) that turns edits into
//!   requests and keeps only the latest result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livelint::{AnalyzeRequest, Dispatcher};
//! use livelint::config::AnalysisConfig;
//!
//! # async fn demo() {
//! let dispatcher = Dispatcher::from_config(&AnalysisConfig::default());
//! let result = dispatcher
//!     .dispatch(&AnalyzeRequest::new("python", "def greet(name)\n    pass\n"))
//!     .await;
//!
//! for diagnostic in result.diagnostics() {
//!     println!("{}", diagnostic);
//! }
//! # }
//! ```
//!
//! ## Configuration
//!
//! Server and analyzer settings load from JSON, YAML or TOML:
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [auth]
//! mode = "static"
//! tokens = { "dev-token" = "developer" }
//!
//! [analysis]
//! timeout_ms = 10000
//!
//! [analysis.cpp]
//! compiler = "clang++"
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzers;
pub mod config;
pub mod dispatch;
pub mod formatters;
pub mod protocol;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

// Re-export main types and functions
pub use analyzers::{Analyzer, AnalyzerRegistry};
pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use types::{
    AnalysisResult, AnalyzeRequest, AnalyzerError, AuthError, Diagnostic, Language,
    LivelintError, Result, Severity,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
