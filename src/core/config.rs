//! Configuration management for the MCP server.
//!
//! Everything is read once at startup from the environment (after loading an
//! optional `.env` file) and threaded explicitly into the server.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{Error, Result};

/// Default upstream API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Default request and stream inactivity timeout (5 minutes).
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Perplexity API access.
    pub perplexity: PerplexityConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Perplexity API credentials and transport settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct PerplexityConfig {
    /// Bearer token sent with every request.
    pub api_key: String,

    /// Per-request timeout; also the inactivity limit while streaming.
    pub timeout_ms: u64,

    /// Upstream base URL, without a trailing slash.
    pub base_url: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for PerplexityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityConfig")
            .field("api_key", &"[REDACTED]")
            .field("timeout_ms", &self.timeout_ms)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL`. Needed before [`Config::from_env`] so that its
    /// warnings reach an installed subscriber.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        match std::env::var("MCP_LOG_LEVEL") {
            Ok(level) => Self { level },
            Err(_) => Self::default(),
        }
    }
}

impl PerplexityConfig {
    /// Settings for the given key with default timeout and base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Create a configuration with defaults around the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                name: "perplexity-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            perplexity: PerplexityConfig::new(api_key),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `PERPLEXITY_API_KEY` is required. `PERPLEXITY_TIMEOUT_MS`,
    /// `PERPLEXITY_BASE_URL`, `MCP_SERVER_NAME` and `MCP_LOG_LEVEL` are
    /// optional.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("PERPLEXITY_API_KEY environment variable is required"))?;

        let mut config = Self::new(api_key);

        if let Ok(timeout) = std::env::var("PERPLEXITY_TIMEOUT_MS") {
            match parse_timeout(&timeout) {
                Some(ms) => config.perplexity.timeout_ms = ms,
                None => warn!(
                    value = %timeout,
                    "Invalid PERPLEXITY_TIMEOUT_MS, using default of {}ms",
                    DEFAULT_TIMEOUT_MS
                ),
            }
        }

        if let Ok(base_url) = std::env::var("PERPLEXITY_BASE_URL") {
            let base_url = base_url.trim().trim_end_matches('/');
            if !base_url.is_empty() {
                config.perplexity.base_url = base_url.to_string();
            }
        }

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        Ok(config)
    }
}

fn parse_timeout(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|ms| *ms > 0)
}
