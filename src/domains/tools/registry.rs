//! Tool Registry - central registration and dispatch for all tools.
//!
//! [`ToolRegistry::call_tool`] is the single entry point for tool calls.
//! Every failure is turned into an `isError` result here, so nothing a
//! client sends can take the server down.

use std::sync::Arc;
use tracing::{info, warn};

use rmcp::model::{CallToolResult, Tool};

use crate::core::config::Config;
use crate::domains::perplexity::{PerplexityClient, RawArguments};

use super::definitions::common::{error_result, success_result};
use super::definitions::{
    AgentTool, AskTool, EmbedTool, ReasonTool, ResearchAsyncTool, ResearchStatusTool,
    ResearchTool, SearchTool,
};
use super::error::{ToolError, ToolResult};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - owns the API client and dispatches calls by name.
pub struct ToolRegistry {
    client: Arc<PerplexityClient>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(client: Arc<PerplexityClient>) -> Self {
        Self { client }
    }

    /// Build the registry and its client from the server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(PerplexityClient::from_config(&config.perplexity)))
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            AskTool::NAME,
            ResearchTool::NAME,
            ReasonTool::NAME,
            SearchTool::NAME,
            ResearchAsyncTool::NAME,
            ResearchStatusTool::NAME,
            AgentTool::NAME,
            EmbedTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            AskTool::to_tool(),
            ResearchTool::to_tool(),
            ReasonTool::to_tool(),
            SearchTool::to_tool(),
            ResearchAsyncTool::to_tool(),
            ResearchStatusTool::to_tool(),
            AgentTool::to_tool(),
            EmbedTool::to_tool(),
        ]
    }

    /// Run a tool and render the outcome.
    ///
    /// Unknown names render as `Unknown tool: <name>`; every other failure
    /// renders as `Error: <message>`. Both carry `isError: true`.
    pub async fn call_tool(&self, name: &str, arguments: Option<RawArguments>) -> CallToolResult {
        match self.dispatch(name, arguments).await {
            Ok(text) => success_result(text),
            Err(err @ ToolError::NotFound(_)) => error_result(err.to_string()),
            Err(err) => {
                warn!(tool = name, "Tool call failed");
                error_result(format!("Error: {err}"))
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Option<RawArguments>) -> ToolResult<String> {
        let args = arguments.ok_or(ToolError::MissingArguments)?;
        let client = self.client.as_ref();
        info!(tool = name, "Tool called");

        match name {
            AskTool::NAME => AskTool::execute(&args, client).await,
            ResearchTool::NAME => ResearchTool::execute(&args, client).await,
            ReasonTool::NAME => ReasonTool::execute(&args, client).await,
            SearchTool::NAME => SearchTool::execute(&args, client).await,
            ResearchAsyncTool::NAME => ResearchAsyncTool::execute(&args, client).await,
            ResearchStatusTool::NAME => ResearchStatusTool::execute(&args, client).await,
            AgentTool::NAME => AgentTool::execute(&args, client).await,
            EmbedTool::NAME => EmbedTool::execute(&args, client).await,
            _ => Err(ToolError::not_found(name)),
        }
    }
}
