//! Timed HTTP client for the Perplexity API.

use reqwest::{RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::format::{Extras, append_extras};
use super::request::{
    AgentRequestBody, AsyncResearchBody, ChatRequestBody, EmbeddingsRequestBody,
    SearchRequestBody,
};
use super::stream::{AssembledResponse, assemble};
use super::types::{
    AsyncResearchResult, AsyncResearchStart, AsyncStatus, AsyncStatusResponse, ChatResponse,
    EmbeddingsResponse, SearchResponse,
};
use crate::core::config::PerplexityConfig;

/// Upstream endpoints, each with the name used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Search,
    AsyncResearch,
    Agent,
    Embeddings,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::ChatCompletions => "/chat/completions",
            Self::Search => "/search",
            Self::AsyncResearch => "/async/chat/completions",
            Self::Agent => "/v1/responses",
            Self::Embeddings => "/v1/embeddings",
        }
    }

    pub fn api_name(self) -> &'static str {
        match self {
            Self::ChatCompletions => "Perplexity API",
            Self::Search => "Perplexity Search API",
            Self::AsyncResearch => "Perplexity Async API",
            Self::Agent => "Perplexity Agent API",
            Self::Embeddings => "Perplexity Embeddings API",
        }
    }
}

/// Client shared by every tool. Immutable once built.
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PerplexityClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn from_config(config: &PerplexityConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn post<B: Serialize + ?Sized>(&self, endpoint: Endpoint, body: &B) -> RequestBuilder {
        self.http
            .post(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Non-streaming chat completion.
    pub async fn chat_completion(&self, body: &ChatRequestBody) -> ApiResult<ChatResponse> {
        let endpoint = Endpoint::ChatCompletions;
        debug!(model = %body.model, "Sending chat completion");

        let response: ChatResponse = self.execute(endpoint, self.post(endpoint, body)).await?;
        if response.choices.is_empty() {
            return Err(ApiError::malformed(
                endpoint.api_name(),
                "response contained no choices",
            ));
        }
        Ok(response)
    }

    /// Streaming chat completion, assembled into a single answer.
    ///
    /// The wait for response headers is bounded by the configured timeout;
    /// after that the same window applies to each gap between chunks.
    pub async fn chat_completion_stream(
        &self,
        body: &ChatRequestBody,
    ) -> ApiResult<AssembledResponse> {
        let endpoint = Endpoint::ChatCompletions;
        let api = endpoint.api_name();
        debug!(model = %body.model, "Sending streaming chat completion");

        let request = self.post(endpoint, body);
        let response = tokio::time::timeout(self.timeout, async {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::network(api, e.to_string()))?;
            check_status(api, response).await
        })
        .await
        .map_err(|_| ApiError::Timeout {
            api,
            timeout_ms: self.timeout_ms(),
        })??;

        assemble(response.bytes_stream(), self.timeout, api).await
    }

    pub async fn search(&self, body: &SearchRequestBody) -> ApiResult<SearchResponse> {
        debug!(query = %body.query, "Sending search");
        self.execute(Endpoint::Search, self.post(Endpoint::Search, body))
            .await
    }

    pub async fn start_async_research(
        &self,
        body: &AsyncResearchBody,
    ) -> ApiResult<AsyncResearchStart> {
        let endpoint = Endpoint::AsyncResearch;
        let mut started: AsyncResearchStart =
            self.execute(endpoint, self.post(endpoint, body)).await?;
        started.status.get_or_insert_with(|| "pending".to_string());
        Ok(started)
    }

    /// Poll an async research job. A completed job's answer comes back with
    /// its citations already appended.
    pub async fn async_research_status(&self, request_id: &str) -> ApiResult<AsyncResearchResult> {
        let endpoint = Endpoint::AsyncResearch;
        let url = self.status_url(request_id)?;
        let request = self.http.get(url).bearer_auth(&self.api_key);

        let raw: AsyncStatusResponse = self.execute(endpoint, request).await?;

        let result = match (raw.status, raw.choices.first()) {
            (AsyncStatus::Completed, Some(choice)) => Some(append_extras(
                &choice.message.content,
                &Extras::with_citations(raw.citations.clone()),
            )),
            _ => None,
        };

        Ok(AsyncResearchResult {
            request_id: raw.request_id,
            status: raw.status,
            created_at: raw.created_at,
            completed_at: raw.completed_at,
            result,
            error: raw.error,
        })
    }

    /// Agent call. The payload shape varies by preset, so it stays untyped.
    pub async fn agent(&self, body: &AgentRequestBody) -> ApiResult<Value> {
        self.execute(Endpoint::Agent, self.post(Endpoint::Agent, body))
            .await
    }

    pub async fn embeddings(&self, body: &EmbeddingsRequestBody) -> ApiResult<EmbeddingsResponse> {
        self.execute(Endpoint::Embeddings, self.post(Endpoint::Embeddings, body))
            .await
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    /// `{base}/async/chat/completions/{id}` with the id as one encoded segment.
    fn status_url(&self, request_id: &str) -> ApiResult<Url> {
        let api = Endpoint::AsyncResearch.api_name();
        let mut url = Url::parse(&self.url(Endpoint::AsyncResearch))
            .map_err(|e| ApiError::network(api, format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::network(api, "invalid base URL: cannot hold a path"))?
            .push(request_id);
        Ok(url)
    }

    /// Send a request and decode its JSON body. The whole exchange, headers
    /// and body, runs under the configured timeout.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let api = endpoint.api_name();

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::network(api, e.to_string()))?;
            let response = check_status(api, response).await?;
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::network(api, e.to_string()))?;
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::malformed(api, e.to_string()))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(api, timeout_ms = self.timeout_ms(), "Upstream request timed out");
                Err(ApiError::Timeout {
                    api,
                    timeout_ms: self.timeout_ms(),
                })
            }
        }
    }
}

/// Turn a non-2xx response into [`ApiError::Upstream`].
async fn check_status(api: &'static str, response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to parse error response".to_string());
    warn!(api, status = status.as_u16(), "Upstream request failed");

    Err(ApiError::Upstream {
        api,
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}
