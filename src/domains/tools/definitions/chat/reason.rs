//! `perplexity_reason` tool definition.

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use std::sync::Arc;
use tracing::{info, instrument};

use super::complete;
use super::params::{BaseChatParams, ExtendedChatParams};
use crate::domains::perplexity::options::{build_common_options, flag_arg, parse_messages};
use crate::domains::perplexity::types::Message;
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

/// Parameters for the reason tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct ReasonParams {
    /// Array of conversation messages.
    pub messages: Vec<Message>,

    /// Enable streaming responses. Default: false
    #[serde(default)]
    pub stream: Option<bool>,

    #[serde(flatten)]
    pub base: BaseChatParams,

    #[serde(flatten)]
    pub extended: ExtendedChatParams,
}

pub struct ReasonTool;

impl ReasonTool {
    pub const NAME: &'static str = "perplexity_reason";

    pub const DESCRIPTION: &'static str = "Performs reasoning tasks using the Perplexity API. \
        Accepts an array of messages and returns a well-reasoned response using the sonar-reasoning-pro model.";

    pub const MODEL: &'static str = "sonar-reasoning-pro";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let messages = parse_messages(args, Self::NAME)?;
        let stream = flag_arg(args, "stream");
        info!(stream, messages = messages.len(), "Reason tool called");

        let options = build_common_options(args);
        complete(client, &messages, Self::MODEL, &options, stream).await
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ReasonParams>(),
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
    async fn test_reason_forwards_extended_options() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "sonar-reasoning-pro",
                "search_type": "pro",
                "disable_search": true,
                "response_format": { "type": "json_schema" }
            })))
            .with_status(200)
            .with_body(json!({ "choices": [{ "message": { "content": "42" } }] }).to_string())
            .create_async()
            .await;

        let client = PerplexityClient::new("k", server.url(), Duration::from_secs(5));
        let args = json!({
            "messages": [{ "role": "user", "content": "Think" }],
            "search_type": "pro",
            "disable_search": true,
            "response_format": { "type": "json_schema" }
        });
        let text = ReasonTool::execute(args.as_object().unwrap(), &client)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "42");
    }

    #[tokio::test]
    async fn test_reason_upstream_error_propagates() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = PerplexityClient::new("k", server.url(), Duration::from_secs(5));
        let args = json!({ "messages": [{ "role": "user", "content": "Think" }] });
        let err = ReasonTool::execute(args.as_object().unwrap(), &client)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Perplexity API error: 429 Too Many Requests\nrate limited"
        );
    }
}
