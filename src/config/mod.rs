//! Configuration parsing and management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::types::{Language, LivelintError, Result};

/// Configuration for the livelint server and local analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener settings
    pub server: ListenConfig,

    /// How session tokens are verified
    pub auth: AuthConfig,

    /// Per-user request limits
    pub rate_limit: RateLimitConfig,

    /// Analyzer settings
    pub analysis: AnalysisConfig,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Address to bind
    pub bind: String,
    /// TCP port
    pub port: u16,
    /// Deployment environment label, reported in logs
    pub env: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            env: "development".to_string(),
        }
    }
}

/// Token verification strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Accept any non-empty token (testing only)
    Mock,
    /// Fixed token → user id table
    Static {
        /// Accepted tokens and the user each one identifies
        #[serde(default)]
        tokens: HashMap<String, String>,
    },
    /// Ask an external auth service
    Remote {
        /// Base URL; `/auth/v1/user` is appended
        url: String,
        /// Value of the `apikey` header
        #[serde(default)]
        api_key: String,
        /// Request timeout in milliseconds
        #[serde(default = "default_auth_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_auth_timeout_ms() -> u64 {
    5_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::Static {
            tokens: HashMap::new(),
        }
    }
}

/// Sliding-window request limit per user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests: usize,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 60,
            window_secs: 60,
        }
    }
}

/// Analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Per-request analyzer timeout in milliseconds (0 disables)
    pub timeout_ms: u64,
    /// Replace every analyzer with the canned mock analyzer
    pub mock: bool,
    /// Languages to leave without an analyzer
    pub disabled_languages: Vec<Language>,
    /// TypeScript tooling
    pub typescript: TypeScriptConfig,
    /// Python tooling
    pub python: PythonConfig,
    /// Go tooling
    pub go: GoConfig,
    /// Dart tooling
    pub dart: DartConfig,
    /// C++ tooling
    pub cpp: CppConfig,
}

impl AnalysisConfig {
    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            mock: false,
            disabled_languages: Vec::new(),
            typescript: TypeScriptConfig::default(),
            python: PythonConfig::default(),
            go: GoConfig::default(),
            dart: DartConfig::default(),
            cpp: CppConfig::default(),
        }
    }
}

/// TypeScript tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeScriptConfig {
    /// Node.js executable
    pub node: String,
    /// `NODE_PATH` used to resolve the `typescript` package.
    ///
    /// When unset, an inherited `NODE_PATH` is kept, or `npm root -g` is
    /// asked for the global package directory.
    pub node_path: Option<String>,
    /// npm executable, used only to locate global packages
    pub npm: String,
}

impl Default for TypeScriptConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            node_path: None,
            npm: "npm".to_string(),
        }
    }
}

/// Python tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Python 3 executable
    pub python: String,
    /// Run pyflakes when it is importable
    pub pyflakes: bool,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            pyflakes: true,
        }
    }
}

/// Go tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    /// `go` executable
    pub go: String,
    /// `gofmt` executable
    pub gofmt: String,
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            gofmt: "gofmt".to_string(),
        }
    }
}

/// Dart tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DartConfig {
    /// `dart` executable
    pub dart: String,
}

impl Default for DartConfig {
    fn default() -> Self {
        Self {
            dart: "dart".to_string(),
        }
    }
}

/// C++ tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CppConfig {
    /// GCC-compatible compiler
    pub compiler: String,
    /// Language standard passed as `-std=`
    pub std: String,
    /// Additional compiler flags
    pub extra_args: Vec<String>,
}

impl Default for CppConfig {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            std: "c++17".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LivelintError::FileNotFound(path.display().to_string()));
        }
        let ext = path.extension().and_then(|e| e.to_str());

        match ext {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("toml") => Self::from_toml_file(path),
            _ => {
                // Try TOML first, then JSON, then YAML
                Self::from_toml_file(path)
                    .or_else(|_| Self::from_json_file(path))
                    .or_else(|_| Self::from_yaml_file(path))
            }
        }
    }

    /// Config file names to search for during auto-discovery
    const DISCOVERY_NAMES: [&'static str; 4] = [
        "livelint.toml",
        ".livelint.toml",
        ".livelint.json",
        ".livelint.yaml",
    ];

    /// Walk up from `start_dir` looking for a config file
    pub fn discover(start_dir: impl AsRef<Path>) -> Option<Self> {
        let mut dir = start_dir.as_ref().to_path_buf();
        loop {
            for name in &Self::DISCOVERY_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    match Self::from_file(&candidate) {
                        Ok(config) => return Some(config),
                        Err(e) => log::warn!("Ignoring {}: {}", candidate.display(), e),
                    }
                }
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Load from an explicit file, or defaults, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(bind) = get("LIVELINT_BIND") {
            self.server.bind = bind;
        }
        if let Some(env) = get("LIVELINT_ENV") {
            self.server.env = env;
        }
        if let Some(timeout) = get("LIVELINT_ANALYSIS_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => self.analysis.timeout_ms = ms,
                Err(_) => log::warn!("Ignoring invalid LIVELINT_ANALYSIS_TIMEOUT_MS: {}", timeout),
            }
        }
        if let Some(mock) = get("LIVELINT_MOCK_ANALYZERS").and_then(|v| parse_bool(&v)) {
            self.analysis.mock = mock;
        }
        if let Some(url) = get("LIVELINT_AUTH_URL") {
            let api_key = get("LIVELINT_AUTH_API_KEY").unwrap_or_default();
            self.auth = AuthConfig::Remote {
                url,
                api_key,
                timeout_ms: default_auth_timeout_ms(),
            };
        }
        if get("LIVELINT_MOCK_AUTH").and_then(|v| parse_bool(&v)) == Some(true) {
            self.auth = AuthConfig::Mock;
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(LivelintError::InvalidConfig(
                "rate_limit.requests and rate_limit.window_secs must be positive".to_string(),
            ));
        }
        if let AuthConfig::Remote { url, .. } = &self.auth
            && url.trim().is_empty()
        {
            return Err(LivelintError::InvalidConfig(
                "auth.url must not be empty in remote mode".to_string(),
            ));
        }
        Ok(())
    }
}

/// Boolean parsing compatible with the usual env conventions
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
