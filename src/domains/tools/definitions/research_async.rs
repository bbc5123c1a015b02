//! Async deep research: submit a job, then poll it.
//!
//! No job state is kept here. The request id returned upstream is the only
//! handle, and every poll asks the API again.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::perplexity::format::{format_async_started, format_async_status};
use crate::domains::perplexity::options::{
    ReasoningEffort, build_common_options, parse_messages, string_arg,
};
use crate::domains::perplexity::request::build_async_research_body;
use crate::domains::perplexity::types::Message;
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::{ToolError, ToolResult};

// ============================================================================
// Submit
// ============================================================================

/// Parameters for starting an async research job.
#[derive(Debug, Clone, JsonSchema)]
pub struct ResearchAsyncParams {
    /// Array of conversation messages.
    pub messages: Vec<Message>,

    /// Controls research depth.
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Domain filter list. Prefix with '-' to exclude. Maximum 20 domains.
    #[serde(default)]
    pub search_domain_filter: Option<Vec<String>>,
}

pub struct ResearchAsyncTool;

impl ResearchAsyncTool {
    pub const NAME: &'static str = "perplexity_research_async";

    pub const DESCRIPTION: &'static str = "Start an async deep research job. Returns a request_id to poll for results. \
        Use for complex research that may take several minutes.";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let messages = parse_messages(args, Self::NAME)?;
        let body = build_async_research_body(&messages, &build_common_options(args))?;

        let started = client.start_async_research(&body).await?;
        let status = started.status.as_deref().unwrap_or("pending");
        info!(request_id = %started.request_id, status, "Async research job submitted");

        Ok(format_async_started(&started.request_id, status))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ResearchAsyncParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(registry: Arc<ToolRegistry>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        registry_route(Self::to_tool(), registry)
    }
}

// ============================================================================
// Poll
// ============================================================================

/// Parameters for polling an async research job.
#[derive(Debug, Clone, JsonSchema)]
pub struct ResearchStatusParams {
    /// The request_id returned from perplexity_research_async.
    pub request_id: String,
}

pub struct ResearchStatusTool;

impl ResearchStatusTool {
    pub const NAME: &'static str = "perplexity_research_status";

    pub const DESCRIPTION: &'static str = "Check status of an async research job and retrieve results when complete. \
        Use the request_id returned from perplexity_research_async.";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let request_id = string_arg(args, "request_id").ok_or_else(|| {
            ToolError::invalid_arguments(
                "Invalid arguments for perplexity_research_status: 'request_id' must be a string",
            )
        })?;

        let job = client.async_research_status(request_id).await?;
        info!(request_id, status = %job.status, "Async research job polled");

        Ok(format_async_status(&job))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ResearchStatusParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(registry: Arc<ToolRegistry>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        registry_route(Self::to_tool(), registry)
    }
}
