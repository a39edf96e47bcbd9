//! HTTP service hosting the live session socket
//!
//! Routes:
//!
//! - `GET /ws?token=<token>`: token-authenticated WebSocket upgrade
//! - `GET /health`: liveness and connection count
//! - `GET /metrics`: Prometheus metrics
//! - `GET /`: service banner
//!
//! Every HTTP request passes through a layer that logs it and records
//! request metrics.

pub mod auth;
mod connection;
pub mod metrics;
pub mod ratelimit;

pub use auth::{
    MockTokenVerifier, RemoteTokenVerifier, SharedVerifier, StaticTokenVerifier, TokenVerifier,
    UserId, verifier_from_config,
};
pub use metrics::Metrics;
pub use ratelimit::RateLimiter;

use crate::config::{RateLimitConfig, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::types::{AuthError, Result};
use axum::Router;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// How often idle rate-limit entries are pruned
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) verifier: SharedVerifier,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) active: Arc<AtomicUsize>,
    pub(crate) metrics: Arc<Metrics>,
}

impl AppState {
    /// Assemble server state from its collaborators
    pub fn new(
        dispatcher: Dispatcher,
        verifier: SharedVerifier,
        rate_limit: &RateLimitConfig,
    ) -> Result<Self> {
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            verifier,
            limiter: Arc::new(RateLimiter::new(rate_limit.requests, rate_limit.window())),
            active: Arc::new(AtomicUsize::new(0)),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    /// Build the state described by a full server configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let dispatcher = Dispatcher::from_config(&config.analysis);
        let verifier = verifier_from_config(&config.auth)?;
        log::info!(
            "Analyzers: {:?}{}",
            dispatcher.registry().languages(),
            if config.analysis.mock { " (mock)" } else { "" }
        );
        Self::new(dispatcher, verifier, &config.rate_limit)
    }

    /// Number of open sockets
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/ws", get(ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track_requests))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("WebSocket endpoint: ws://{}/ws", addr);
        log::info!("Health check: http://{}/health", addr);
        log::info!("Prometheus metrics: http://{}/metrics", addr);
    }

    let pruner = state.limiter.spawn_pruner(PRUNE_INTERVAL);
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    pruner.abort();
    log::info!("Server stopped");
    served
}

/// Resolve on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down server...");
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "livelint live analysis server",
        "version": crate::VERSION,
        "endpoints": {
            "/ws": "WebSocket endpoint",
            "/health": "Health check",
            "/metrics": "Prometheus metrics",
        },
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "active_connections": state.active_connections(),
    }))
}

#[derive(Debug, Deserialize)]
struct WsParams {
    token: Option<String>,
}

async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    upgrade: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = params.token.unwrap_or_default();
    if token.is_empty() {
        log::warn!("Rejected WebSocket request without token");
        return (StatusCode::UNAUTHORIZED, "Missing auth token").into_response();
    }

    let user_id = match state.verifier.verify(&token).await {
        Ok(user_id) => user_id,
        Err(AuthError::MissingToken) => {
            return (StatusCode::UNAUTHORIZED, "Missing auth token").into_response();
        }
        Err(e) => {
            log::warn!("Failed to verify token: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid auth token").into_response();
        }
    };

    match upgrade {
        Ok(upgrade) => upgrade
            .on_upgrade(move |socket| connection::handle_socket(socket, state, user_id))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
