//! livelint live analysis server
//!
//! Usage: `livelint-server [CONFIG_FILE]`
//!
//! The config file may also be given through `LIVELINT_CONFIG`. Environment
//! overrides (`PORT`, `LIVELINT_MOCK_ANALYZERS`, ...) apply on top of it.

use anyhow::Context;
use livelint::ServerConfig;
use livelint::server::{AppState, serve, shutdown_signal};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("LIVELINT_CONFIG").map(PathBuf::from));
    let config = ServerConfig::load(config_path.as_deref())
        .context("failed to load configuration")?;

    log::info!("Starting livelint server {}", livelint::VERSION);
    log::info!("Environment: {}", config.server.env);
    log::info!("Mock analyzers: {}", config.analysis.mock);

    let state = AppState::from_config(&config)?;
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    serve(listener, state, shutdown_signal()).await?;
    Ok(())
}
