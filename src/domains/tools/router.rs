//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Each route forwards to [`ToolRegistry::call_tool`], so calls arriving over
//! the MCP transport get exactly the same error handling as direct calls.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::{
    AgentTool, AskTool, EmbedTool, ReasonTool, ResearchAsyncTool, ResearchStatusTool,
    ResearchTool, SearchTool,
};
use super::registry::ToolRegistry;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(AskTool::create_route(registry.clone()))
        .with_route(ResearchTool::create_route(registry.clone()))
        .with_route(ReasonTool::create_route(registry.clone()))
        .with_route(SearchTool::create_route(registry.clone()))
        .with_route(ResearchAsyncTool::create_route(registry.clone()))
        .with_route(ResearchStatusTool::create_route(registry.clone()))
        .with_route(AgentTool::create_route(registry.clone()))
        .with_route(EmbedTool::create_route(registry))
}
