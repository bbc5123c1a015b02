//! `perplexity_research` tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use std::sync::Arc;
use tracing::{info, instrument};

use super::complete;
use super::params::BaseChatParams;
use crate::domains::perplexity::options::{ReasoningEffort, build_common_options, parse_messages};
use crate::domains::perplexity::types::Message;
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

/// Parameters for the research tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct ResearchParams {
    /// Array of conversation messages.
    pub messages: Vec<Message>,

    /// Controls research depth.
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Include relevant images. Default: false
    #[serde(default)]
    pub return_images: Option<bool>,

    /// Include related questions. Default: false
    #[serde(default)]
    pub return_related_questions: Option<bool>,

    #[serde(flatten)]
    pub base: BaseChatParams,
}

/// Deep research on `sonar-deep-research`. Never streams: the answer can
/// take minutes and is returned whole.
pub struct ResearchTool;

impl ResearchTool {
    pub const NAME: &'static str = "perplexity_research";

    pub const DESCRIPTION: &'static str = "Performs deep research using the Perplexity API. \
        Accepts an array of messages and returns a comprehensive research response with citations.";

    pub const MODEL: &'static str = "sonar-deep-research";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let messages = parse_messages(args, Self::NAME)?;
        info!(messages = messages.len(), "Research tool called");

        let options = build_common_options(args);
        complete(client, &messages, Self::MODEL, &options, false).await
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ResearchParams>(),
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
