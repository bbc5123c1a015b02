//! `perplexity_ask` tool definition.
//!
//! Real-time answers with web search on the `sonar` family of models.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::complete;
use super::params::{BaseChatParams, ExtendedChatParams};
use crate::domains::perplexity::options::{build_common_options, enum_arg, flag_arg, parse_messages};
use crate::domains::perplexity::types::Message;
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Models available to `perplexity_ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AskModel {
    Sonar,
    SonarPro,
}

impl AskModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sonar => "sonar",
            Self::SonarPro => "sonar-pro",
        }
    }
}

/// Parameters for the ask tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct AskParams {
    /// Array of conversation messages.
    pub messages: Vec<Message>,

    /// Model to use: 'sonar' for fast, cost-effective queries, 'sonar-pro' for
    /// higher quality (default).
    #[serde(default)]
    pub model: Option<AskModel>,

    /// Enable streaming responses. Default: false
    #[serde(default)]
    pub stream: Option<bool>,

    /// Include relevant images. Default: false
    #[serde(default)]
    pub return_images: Option<bool>,

    /// Include related question suggestions. Default: false
    #[serde(default)]
    pub return_related_questions: Option<bool>,

    #[serde(flatten)]
    pub base: BaseChatParams,

    #[serde(flatten)]
    pub extended: ExtendedChatParams,
}

// ============================================================================
// Tool Definition
// ============================================================================

pub struct AskTool;

impl AskTool {
    pub const NAME: &'static str = "perplexity_ask";

    pub const DESCRIPTION: &'static str = "Real-time AI-powered answers with web search. \
        Supports sonar (fast/cheap) and sonar-pro (high quality) models. \
        Accepts an array of messages and returns a completion response with citations.";

    pub const DEFAULT_MODEL: AskModel = AskModel::SonarPro;

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let messages = parse_messages(args, Self::NAME)?;
        let model = enum_arg::<AskModel>(args, "model").unwrap_or(Self::DEFAULT_MODEL);
        let stream = flag_arg(args, "stream");

        info!(
            model = model.as_str(),
            stream,
            messages = messages.len(),
            "Ask tool called"
        );

        let options = build_common_options(args);
        complete(client, &messages, model.as_str(), &options, stream).await
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<AskParams>(),
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
// Tests
// ============================================================================
