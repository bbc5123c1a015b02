//! Perplexity MCP Server Library
//!
//! Exposes the Perplexity API (chat completions, search, async deep
//! research, agent responses and embeddings) as Model Context Protocol tools
//! served over stdio.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the server handler and transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **perplexity**: Option validation, request bodies, the HTTP client,
//!     SSE stream assembly and result formatting
//!   - **tools**: MCP tool definitions, registry and router
//!
//! # Example
//!
//! ```rust,no_run
//! use perplexity_mcp_server::core::{Config, McpServer, StdioTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = McpServer::new(config);
//!     StdioTransport::run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
