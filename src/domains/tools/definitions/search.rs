//! `perplexity_search` tool definition.
//!
//! Ranked web results from the Search API. A batch of up to five queries
//! fans out concurrently; one failing query never sinks the others.

use futures::future::join_all;
use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domains::perplexity::format::{
    QueryOutcome, format_multi_query_results, format_search_results,
};
use crate::domains::perplexity::options::RecencyFilter;
use crate::domains::perplexity::request::{
    SearchQuery, batch_queries, build_search_body, build_search_options,
};
use crate::domains::perplexity::{ApiResult, PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the search tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct SearchParams {
    /// Search query or array of queries (max 5).
    pub query: SearchQuery,

    /// Maximum results to return (1-20, default: 10).
    #[serde(default)]
    pub max_results: Option<i64>,

    /// Maximum tokens per webpage (256-2048, default: 1024).
    #[serde(default)]
    pub max_tokens_per_page: Option<i64>,

    /// ISO 3166-1 alpha-2 country code for regional results.
    #[serde(default)]
    pub country: Option<String>,

    /// Domain filter list. Prefix with '-' to exclude. Maximum 20 domains.
    #[serde(default)]
    pub search_domain_filter: Option<Vec<String>>,

    /// Filter results by recency.
    #[serde(default)]
    pub search_recency_filter: Option<RecencyFilter>,

    /// Only results after this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub search_after_date: Option<String>,

    /// Only results before this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub search_before_date: Option<String>,

    /// Only results updated after. Format: MM/DD/YYYY
    #[serde(default)]
    pub last_updated_after: Option<String>,

    /// Only results updated before. Format: MM/DD/YYYY
    #[serde(default)]
    pub last_updated_before: Option<String>,

    /// ISO 639-1 language codes to filter results.
    #[serde(default)]
    pub search_language_filter: Option<Vec<String>>,

    /// Approximate user location used to localize results.
    #[serde(default)]
    pub user_location: Option<serde_json::Map<String, serde_json::Value>>,
}

// ============================================================================
// Tool Definition
// ============================================================================

pub struct SearchTool;

impl SearchTool {
    pub const NAME: &'static str = "perplexity_search";

    pub const DESCRIPTION: &'static str = "Performs web search using the Perplexity Search API. \
        Supports single query or batch of up to 5 queries. \
        Returns ranked search results with titles, URLs, snippets, and metadata.";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let query = SearchQuery::from_args(args)?;
        let queries = batch_queries(&query)?;
        let options = build_search_options(args);

        // Every body is built up front, so a bad option fails the whole call
        // before anything is sent.
        let bodies = queries
            .iter()
            .map(|q| build_search_body(q, &options))
            .collect::<ApiResult<Vec<_>>>()?;

        info!(queries = bodies.len(), "Search tool called");

        if let [body] = bodies.as_slice() {
            let response = client.search(body).await?;
            return Ok(format_search_results(&response));
        }

        let outcomes = join_all(bodies.into_iter().map(|body| async move {
            let result = client.search(&body).await.map_err(|e| {
                warn!(query = %body.query, error = %e, "Batched search query failed");
                e.to_string()
            });
            QueryOutcome {
                query: body.query,
                result,
            }
        }))
        .await;

        Ok(format_multi_query_results(&outcomes))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SearchParams>(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(url: &str) -> PerplexityClient {
        PerplexityClient::new("test-key", url, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_single_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({
                "query": "tokio",
                "max_results": 3,
                "max_tokens_per_page": 1024,
                "search_after_date_filter": "01/01/2025"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{ "title": "Tokio", "url": "https://tokio.rs", "snippet": "Runtime" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let args = json!({ "query": "tokio", "max_results": 3, "search_after_date": "01/01/2025" });
        let text = SearchTool::execute(args.as_object().unwrap(), &client(&server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            text,
            "Found 1 search results:\n\n1. **Tokio**\n   URL: https://tokio.rs\n   Runtime\n\n"
        );
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({ "query": "good" })))
            .with_status(200)
            .with_body(json!({ "results": [{ "title": "G", "url": "https://g" }] }).to_string())
            .create_async()
            .await;
        server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({ "query": "bad" })))
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let args = json!({ "query": ["good", "bad"] });
        let text = SearchTool::execute(args.as_object().unwrap(), &client(&server.url()))
            .await
            .unwrap();

        let sections: Vec<&str> = text.split("\n---\n\n").collect();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].starts_with("## Query 1: \"good\""));
        assert!(sections[0].contains("Found 1 results:"));
        assert!(sections[1].starts_with("## Query 2: \"bad\""));
        assert!(sections[1].contains(
            "**Error:** Perplexity Search API error: 500 Internal Server Error\nupstream exploded"
        ));
    }

    #[tokio::test]
    async fn test_batch_bounds_and_validation() {
        let offline = client("http://127.0.0.1:1");

        let six = json!({ "query": ["1", "2", "3", "4", "5", "6"] });
        let err = SearchTool::execute(six.as_object().unwrap(), &offline)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum 5 queries per request");

        let empty = json!({ "query": [] });
        let err = SearchTool::execute(empty.as_object().unwrap(), &offline)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "At least one query is required");

        let wide = json!({ "query": ["a", "b"], "max_results": 50 });
        let err = SearchTool::execute(wide.as_object().unwrap(), &offline)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "max_results must be between 1 and 20");
    }
}
