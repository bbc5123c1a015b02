//! MCP Server implementation and lifecycle management.
//!
//! The server only advertises tools. The ToolRouter is built in
//! `domains/tools/router.rs` on top of a shared [`ToolRegistry`], which owns
//! the Perplexity client.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;

use super::config::Config;
use crate::domains::tools::{ToolRegistry, build_tool_router};

const INSTRUCTIONS: &str = "Perplexity API tools: web-grounded chat (perplexity_ask, \
    perplexity_research, perplexity_reason), ranked web search (perplexity_search), \
    background deep research (perplexity_research_async, perplexity_research_status), \
    the agent responses API (perplexity_agent) and text embeddings (perplexity_embed).";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry shared by every tool route.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(ToolRegistry::from_config(&config));
        Self {
            tool_router: build_tool_router::<Self>(registry.clone()),
            registry,
            config: Arc::new(config),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the tool registry (for direct dispatch).
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_info() {
        let server = McpServer::new(Config::new("pplx-test"));
        assert_eq!(server.name(), "perplexity-mcp-server");
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));

        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_server_lists_all_tools() {
        let server = McpServer::new(Config::new("pplx-test"));
        let listed = server.tool_router.list_all();
        assert_eq!(listed.len(), server.registry().tool_names().len());
    }
}
