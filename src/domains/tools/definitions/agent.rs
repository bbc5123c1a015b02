//! `perplexity_agent` tool definition (`POST /v1/responses`).

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::perplexity::format::format_agent_response;
use crate::domains::perplexity::options::ReasoningEffort;
use crate::domains::perplexity::request::{AgentPreset, build_agent_body};
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

/// Reasoning configuration for the agent.
#[derive(Debug, Clone, JsonSchema)]
pub struct AgentReasoning {
    /// Reasoning effort level.
    #[serde(default)]
    pub effort: Option<ReasoningEffort>,
}

/// Parameters for the agent tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct AgentParams {
    /// The user query/prompt to send to the agent.
    pub query: String,

    /// Model to use (e.g. 'anthropic/claude-opus-4-6', 'openai/gpt-5.2',
    /// 'google/gemini-2.5-pro').
    #[serde(default)]
    pub model: Option<String>,

    /// Fallback model chain (up to 5 models). First available model is used.
    #[serde(default)]
    pub models: Option<Vec<String>>,

    /// Search preset to use.
    #[serde(default)]
    pub preset: Option<AgentPreset>,

    /// System prompt for the agent.
    #[serde(default)]
    pub system: Option<String>,

    /// Additional instructions for the agent.
    #[serde(default)]
    pub instructions: Option<String>,

    /// Preferred response language (ISO 639-1 code).
    #[serde(default)]
    pub language: Option<String>,

    /// Maximum reasoning steps (1-10) for multi-step agent reasoning.
    #[serde(default)]
    pub max_steps: Option<i64>,

    #[serde(default)]
    pub reasoning: Option<AgentReasoning>,

    /// Built-in tools configuration (web_search with filters, fetch_url,
    /// custom function tools).
    #[serde(default)]
    pub tools: Option<Vec<Map<String, Value>>>,

    /// Structured output format. Use type 'json_schema' with a schema property
    /// for structured JSON output.
    #[serde(default)]
    pub response_format: Option<Map<String, Value>>,
}

pub struct AgentTool;

impl AgentTool {
    pub const NAME: &'static str = "perplexity_agent";

    pub const DESCRIPTION: &'static str = "Access the Perplexity Agent API (POST /v1/responses). \
        Supports multi-provider models (Claude, GPT, Gemini, Grok), presets (fast-search, pro-search, deep-research, advanced-deep-research), \
        built-in tools (web_search, fetch_url), multi-step reasoning, fallback model chains, structured JSON output, and more.";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let body = build_agent_body(args)?;
        info!(
            model = body.model.as_deref().unwrap_or("default"),
            preset = ?body.preset,
            "Agent tool called"
        );

        let payload = client.agent(&body).await?;
        Ok(format_agent_response(&payload))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<AgentParams>(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_agent_round_trip() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/responses")
            .match_header("authorization", "Bearer k")
            .match_body(Matcher::PartialJson(json!({
                "query": "Latest Rust release?",
                "preset": "fast-search"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "output": [{ "type": "message", "content": [{ "type": "output_text", "text": "Rust 1.90" }] }],
                    "citations": ["https://blog.rust-lang.org"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = PerplexityClient::new("k", server.url(), Duration::from_secs(5));
        let args = json!({ "query": "Latest Rust release?", "preset": "fast-search" });
        let text = AgentTool::execute(args.as_object().unwrap(), &client)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Rust 1.90\n\nCitations:\n[1] https://blog.rust-lang.org\n");
    }

    #[tokio::test]
    async fn test_agent_requires_query() {
        let client = PerplexityClient::new("k", "http://127.0.0.1:1", Duration::from_secs(1));
        let args = json!({ "query": "" });
        let err = AgentTool::execute(args.as_object().unwrap(), &client)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for perplexity_agent: 'query' must be a non-empty string"
        );
    }
}
