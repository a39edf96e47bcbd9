//! Session token verification

use crate::config::AuthConfig;
use crate::types::{AuthError, LivelintError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of an authenticated user
pub type UserId = String;

/// Boxed future returned by [`TokenVerifier::verify`]
pub type VerifyFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<UserId, AuthError>> + Send + 'a>>;

/// Checks a session token and resolves it to a user
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`, returning the user it belongs to
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a>;
}

/// Shared verifier handle
pub type SharedVerifier = Arc<dyn TokenVerifier>;

/// Build the verifier described by the auth configuration
pub fn verifier_from_config(config: &AuthConfig) -> Result<SharedVerifier> {
    let verifier: SharedVerifier = match config {
        AuthConfig::Mock => {
            log::warn!("Mock authentication enabled: any non-empty token is accepted");
            Arc::new(MockTokenVerifier)
        }
        AuthConfig::Static { tokens } => {
            if tokens.is_empty() {
                log::warn!("Static authentication has no tokens configured; every connection will be rejected");
            }
            Arc::new(StaticTokenVerifier::new(tokens.clone()))
        }
        AuthConfig::Remote {
            url,
            api_key,
            timeout_ms,
        } => Arc::new(RemoteTokenVerifier::new(
            url,
            api_key,
            Duration::from_millis(*timeout_ms),
        )?),
    };
    Ok(verifier)
}

/// Accepts any non-empty token
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTokenVerifier;

impl TokenVerifier for MockTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        Box::pin(async move {
            if token.is_empty() {
                return Err(AuthError::MissingToken);
            }
            let prefix: String = token.chars().take(8).collect();
            Ok(format!("mock-user-{}", prefix))
        })
    }
}

/// Fixed table of accepted tokens
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    /// Create a verifier from a token → user table
    pub fn new(tokens: HashMap<String, UserId>) -> Self {
        Self { tokens }
    }

    /// Builder-style insertion of one token
    pub fn with_token(mut self, token: impl Into<String>, user: impl Into<UserId>) -> Self {
        self.tokens.insert(token.into(), user.into());
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        let outcome = if token.is_empty() {
            Err(AuthError::MissingToken)
        } else {
            self.tokens
                .get(token)
                .cloned()
                .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
        };
        Box::pin(async move { outcome })
    }
}

/// Verifies tokens against a hosted auth service (`GET <url>/auth/v1/user`)
#[derive(Debug, Clone)]
pub struct RemoteTokenVerifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct RemoteUser {
    id: String,
}

impl RemoteTokenVerifier {
    /// Create a verifier for the auth service at `base_url`
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("livelint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LivelintError::InvalidConfig(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// Full URL queried for each token
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn check(&self, token: &str) -> std::result::Result<UserId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut request = self
            .http
            .get(&self.endpoint)
            .bearer_auth(token)
            .timeout(self.timeout);
        if !self.api_key.is_empty() {
            request = request.header("apikey", &self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Unavailable("request timed out".to_string())
            } else {
                AuthError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::InvalidToken(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("failed to decode user: {}", e)))?;
        log::info!("Token verified for user: {}", user.id);
        Ok(user.id)
    }
}

impl TokenVerifier for RemoteTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        Box::pin(self.check(token))
    }
}
