//! Error types for calls against the Perplexity API.

use thiserror::Error;

/// Result type for Perplexity API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors raised while building, sending or decoding an upstream request.
///
/// Every variant renders to the message shown to the MCP client, so the
/// `Display` strings are part of the tool contract.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An argument is out of range. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// No response arrived within the configured window.
    #[error(
        "Request timeout: {api} did not respond within {timeout_ms}ms. Consider increasing PERPLEXITY_TIMEOUT_MS."
    )]
    Timeout { api: &'static str, timeout_ms: u64 },

    /// A streaming response stalled for longer than the configured window.
    #[error(
        "Stream timeout: No data received within {timeout_ms}ms. Consider increasing PERPLEXITY_TIMEOUT_MS."
    )]
    StreamTimeout { timeout_ms: u64 },

    /// Transport-level failure (connection refused, reset, DNS...).
    #[error("Network error while calling {api}: {message}")]
    Network { api: &'static str, message: String },

    /// The API answered with a non-2xx status.
    #[error("{api} error: {status} {status_text}\n{body}")]
    Upstream {
        api: &'static str,
        status: u16,
        status_text: String,
        body: String,
    },

    /// The API answered 2xx but the body could not be decoded.
    #[error("Failed to parse JSON response from {api}: {message}")]
    MalformedResponse { api: &'static str, message: String },
}

impl ApiError {
    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new network error.
    pub fn network(api: &'static str, msg: impl Into<String>) -> Self {
        Self::Network {
            api,
            message: msg.into(),
        }
    }

    /// Create a new malformed-response error.
    pub fn malformed(api: &'static str, msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            api,
            message: msg.into(),
        }
    }

    /// Whether the error was raised locally, before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the API itself rejected or garbled the exchange.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::MalformedResponse { .. }
        )
    }

    /// Whether the error is one of the timeout kinds.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::StreamTimeout { .. })
    }
}
