//! Prometheus metrics and per-request HTTP logging

use super::AppState;
use crate::types::{AnalysisResult, Language};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::{Duration, Instant};

/// Latency buckets for analyses, in seconds
const ANALYSIS_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Metrics for one server instance, kept in their own registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    http_in_flight: IntGauge,
    analyses: IntCounterVec,
    analysis_duration: HistogramVec,
    connections: IntGauge,
}

impl Metrics {
    /// Create and register every metric
    pub fn new() -> prometheus::Result<Self> {
        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds"),
            &["method", "endpoint", "status"],
        )?;
        let http_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Current number of HTTP requests being processed",
        )?;
        let analyses = IntCounterVec::new(
            Opts::new("livelint_analyses_total", "Completed analyses by language and outcome"),
            &["language", "outcome"],
        )?;
        let analysis_duration = HistogramVec::new(
            HistogramOpts::new("livelint_analysis_duration_seconds", "Analysis latency in seconds")
                .buckets(ANALYSIS_BUCKETS.to_vec()),
            &["language"],
        )?;
        let connections = IntGauge::new(
            "livelint_websocket_connections",
            "Currently open live session sockets",
        )?;

        let registry = Registry::new();
        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(http_in_flight.clone()))?;
        registry.register(Box::new(analyses.clone()))?;
        registry.register(Box::new(analysis_duration.clone()))?;
        registry.register(Box::new(connections.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            http_in_flight,
            analyses,
            analysis_duration,
            connections,
        })
    }

    /// Record one finished analysis
    pub fn observe_analysis(&self, language: &str, result: &AnalysisResult, elapsed: Duration) {
        // unknown names would otherwise become unbounded label values
        let language = language
            .parse::<Language>()
            .map(|l| l.to_string())
            .unwrap_or_else(|_| "unsupported".to_string());
        let outcome = if result.is_ok() { "ok" } else { "error" };

        self.analyses.with_label_values(&[language.as_str(), outcome]).inc();
        self.analysis_duration
            .with_label_values(&[language.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    pub(crate) fn connection_opened(&self) {
        self.connections.inc();
    }

    pub(crate) fn connection_closed(&self) {
        self.connections.dec();
    }

    /// Prometheus text exposition of every metric
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Endpoint label for a request path; unknown paths share one label
fn endpoint_label(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/ws" => "/ws",
        _ => "other",
    }
}

/// Middleware: count, time and log every HTTP request.
///
/// The query string is never logged since it carries the session token.
pub(crate) async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let endpoint = endpoint_label(&path);
    let start = Instant::now();

    state.metrics.http_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_in_flight.dec();

    let elapsed = start.elapsed();
    let status = response.status();
    let labels = [method.as_str(), endpoint, status.as_str()];
    state.metrics.http_requests.with_label_values(&labels).inc();
    state
        .metrics
        .http_duration
        .with_label_values(&labels)
        .observe(elapsed.as_secs_f64());

    log::info!(
        "{} {} {} {}ms",
        method,
        path,
        status.as_u16(),
        elapsed.as_millis()
    );
    response
}

/// `GET /metrics`
pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(CONTENT_TYPE, TextEncoder::new().format_type().to_string())], body).into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
