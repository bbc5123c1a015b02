//! Tool-specific error types.

use thiserror::Error;

use crate::domains::perplexity::ApiError;

/// Result type for tool execution.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// The call carried no arguments object at all.
    #[error("No arguments provided")]
    MissingArguments,

    /// Invalid arguments were provided to the tool.
    #[error("{0}")]
    InvalidArguments(String),

    /// Validation, transport or upstream failure from the Perplexity API.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_render_unchanged() {
        let err: ToolError = ApiError::validation("top_k must be non-negative").into();
        assert_eq!(err.to_string(), "top_k must be non-negative");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            ToolError::not_found("perplexity_fly").to_string(),
            "Unknown tool: perplexity_fly"
        );
    }
}
