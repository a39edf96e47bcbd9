//! Analysis dispatch: validation, analyzer selection, timing, failure capture

use crate::analyzers::AnalyzerRegistry;
use crate::config::AnalysisConfig;
use crate::types::{AnalysisResult, AnalyzeRequest, AnalyzerError, Diagnostic, Language};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default upper bound for one analyzer call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of every result produced by a failing analyzer
pub const INTERNAL_ERROR_PREFIX: &str = "Internal linter error: ";

/// Routes requests to analyzers and turns every outcome into an [`AnalysisResult`].
///
/// The dispatcher holds no per-request state. Identical requests always
/// re-execute the analyzer.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<AnalyzerRegistry>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with the default timeout
    pub fn new(registry: Arc<AnalyzerRegistry>) -> Self {
        Self {
            registry,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Build the registry and timeout described by the analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(Arc::new(AnalyzerRegistry::from_config(config))).with_timeout(config.timeout())
    }

    /// Replace the analyzer timeout; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The registry requests are routed through
    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Analyze one request.
    ///
    /// Never fails: usage problems and analyzer failures come back as
    /// [`AnalysisResult::Error`], and empty code as a single diagnostic.
    pub async fn dispatch(&self, request: &AnalyzeRequest) -> AnalysisResult {
        let language: Language = match request.language.parse() {
            Ok(language) => language,
            Err(e) => {
                log::debug!("Rejected request: {}", e);
                return AnalysisResult::error(e.to_string());
            }
        };

        if request.code.trim().is_empty() {
            return AnalysisResult::ok(vec![Diagnostic::no_code()], Duration::ZERO);
        }

        let Some(analyzer) = self.registry.get(language) else {
            log::warn!("No analyzer registered for {}", language);
            return AnalysisResult::error(format!(
                "Analyzer not configured for language: {}",
                language
            ));
        };

        let start = Instant::now();
        // the analyzer call itself may panic before it hands back a future
        let call = AssertUnwindSafe(async { analyzer.analyze(&request.code).await }).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Ok(Err(AnalyzerError::Timeout(limit))),
            },
            None => call.await,
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(diagnostics)) => {
                log::info!(
                    "Analyzed {} bytes of {} in {}ms ({} diagnostics)",
                    request.code.len(),
                    language,
                    elapsed.as_millis(),
                    diagnostics.len()
                );
                AnalysisResult::ok(diagnostics, elapsed)
            }
            Ok(Err(e)) => {
                log::error!("{} analyzer failed after {}ms: {:?}", language, elapsed.as_millis(), e);
                AnalysisResult::error(format!("{}{}", INTERNAL_ERROR_PREFIX, e))
            }
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                log::error!("{} analyzer panicked: {}", language, cause);
                AnalysisResult::error(format!("{}analyzer panicked: {}", INTERNAL_ERROR_PREFIX, cause))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
