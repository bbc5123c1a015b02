//! STDIO transport implementation.
//!
//! JSON-RPC frames travel over stdin/stdout; logs must go to stderr.

use rmcp::ServiceExt;
use tracing::info;

use super::TransportError;
use crate::core::{McpServer, Result};

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve the MCP server over stdin/stdout until the client disconnects.
    pub async fn run(server: McpServer) -> Result<()> {
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
