//! Upstream request bodies and the validation gate in front of them.
//!
//! Every builder here is pure: it either returns the exact body that will be
//! serialized onto the wire, or a [`ApiError::Validation`] describing the
//! first violated constraint. Nothing is sent until a builder has succeeded.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, ApiResult};
use super::options::{
    CommonOptions, DateFilters, RawArguments, ReasoningEffort, build_date_filters, enum_arg,
    integer_arg, object_arg, string_arg, string_list_arg,
};
use super::types::Message;

pub const MAX_DOMAIN_FILTERS: usize = 20;
pub const MAX_BATCH_QUERIES: usize = 5;
pub const MAX_AGENT_MODELS: usize = 5;
pub const MAX_EMBEDDING_INPUTS: usize = 512;

pub const DEFAULT_MAX_RESULTS: i64 = 10;
pub const DEFAULT_MAX_TOKENS_PER_PAGE: i64 = 1024;
pub const DEFAULT_EMBEDDING_MODEL: &str = "pplx-embed-v1-4b";
pub const ASYNC_RESEARCH_MODEL: &str = "sonar-deep-research";

// ============================================================================
// Chat completions
// ============================================================================

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,

    #[serde(flatten)]
    pub options: CommonOptions,
}

/// Range-check every numeric and list option.
///
/// Checks run in a fixed order and the first failure wins.
pub fn validate_options(options: &CommonOptions) -> ApiResult<()> {
    check_domain_filter(options.search_domain_filter.as_deref())?;

    if let Some(temperature) = options.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ApiError::validation("temperature must be between 0 and 2"));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        if max_tokens < 1 {
            return Err(ApiError::validation("max_tokens must be at least 1"));
        }
    }
    if let Some(top_p) = options.top_p {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(ApiError::validation("top_p must be between 0 and 1"));
        }
    }
    if let Some(top_k) = options.top_k {
        if top_k < 0 {
            return Err(ApiError::validation("top_k must be non-negative"));
        }
    }

    Ok(())
}

/// Build the chat-completions body. The caller's messages and options are
/// copied, never modified.
pub fn build_chat_body(
    messages: &[Message],
    model: &str,
    options: &CommonOptions,
    stream: bool,
) -> ApiResult<ChatRequestBody> {
    validate_options(options)?;

    Ok(ChatRequestBody {
        model: model.to_string(),
        messages: messages.to_vec(),
        stream,
        options: options.clone(),
    })
}

fn check_domain_filter(filter: Option<&[String]>) -> ApiResult<()> {
    match filter {
        Some(domains) if domains.len() > MAX_DOMAIN_FILTERS => Err(ApiError::validation(format!(
            "search_domain_filter cannot exceed {MAX_DOMAIN_FILTERS} domains"
        ))),
        _ => Ok(()),
    }
}

// ============================================================================
// Async research
// ============================================================================

/// Body of `POST /async/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsyncResearchBody {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<Vec<String>>,
}

/// Build the async deep-research body. Only the reasoning effort and the
/// domain filter are forwarded.
pub fn build_async_research_body(
    messages: &[Message],
    options: &CommonOptions,
) -> ApiResult<AsyncResearchBody> {
    check_domain_filter(options.search_domain_filter.as_deref())?;

    Ok(AsyncResearchBody {
        model: ASYNC_RESEARCH_MODEL.to_string(),
        messages: messages.to_vec(),
        reasoning_effort: options.reasoning_effort,
        search_domain_filter: options.search_domain_filter.clone(),
    })
}

// ============================================================================
// Search
// ============================================================================

/// A single query or a batch of queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SearchQuery {
    Single(String),
    Batch(Vec<String>),
}

impl SearchQuery {
    /// Read the required `query` argument.
    pub fn from_args(args: &RawArguments) -> ApiResult<Self> {
        let invalid = || {
            ApiError::validation(
                "Invalid arguments for perplexity_search: 'query' must be a string or array of strings",
            )
        };

        match args.get("query") {
            Some(Value::String(q)) => Ok(Self::Single(q.clone())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned).ok_or_else(invalid))
                .collect::<ApiResult<Vec<_>>>()
                .map(Self::Batch),
            _ => Err(invalid()),
        }
    }
}

/// Flatten a query into the list of queries to run, enforcing the batch
/// bounds.
pub fn batch_queries(query: &SearchQuery) -> ApiResult<Vec<String>> {
    let queries = match query {
        SearchQuery::Single(q) => vec![q.clone()],
        SearchQuery::Batch(qs) => qs.clone(),
    };

    if queries.is_empty() {
        return Err(ApiError::validation("At least one query is required"));
    }
    if queries.len() > MAX_BATCH_QUERIES {
        return Err(ApiError::validation(format!(
            "Maximum {MAX_BATCH_QUERIES} queries per request"
        )));
    }

    Ok(queries)
}

/// Normalized search options, shared by every query of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub max_results: Option<i64>,
    pub max_tokens_per_page: Option<i64>,
    pub country: Option<String>,
    pub search_domain_filter: Option<Vec<String>>,
    pub date_filters: DateFilters,
    pub search_language_filter: Option<Vec<String>>,
    pub user_location: Option<Map<String, Value>>,
}

pub fn build_search_options(args: &RawArguments) -> SearchOptions {
    SearchOptions {
        max_results: integer_arg(args, "max_results"),
        max_tokens_per_page: integer_arg(args, "max_tokens_per_page"),
        country: string_arg(args, "country").map(str::to_owned),
        search_domain_filter: string_list_arg(args, "search_domain_filter"),
        date_filters: build_date_filters(args),
        search_language_filter: string_list_arg(args, "search_language_filter"),
        user_location: object_arg(args, "user_location"),
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequestBody {
    pub query: String,
    pub max_results: i64,
    pub max_tokens_per_page: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<Vec<String>>,

    #[serde(flatten)]
    pub date_filters: DateFilters,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_language_filter: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Map<String, Value>>,
}

pub fn build_search_body(query: &str, options: &SearchOptions) -> ApiResult<SearchRequestBody> {
    let max_results = options.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    if !(1..=20).contains(&max_results) {
        return Err(ApiError::validation("max_results must be between 1 and 20"));
    }

    let max_tokens_per_page = options
        .max_tokens_per_page
        .unwrap_or(DEFAULT_MAX_TOKENS_PER_PAGE);
    if !(256..=2048).contains(&max_tokens_per_page) {
        return Err(ApiError::validation(
            "max_tokens_per_page must be between 256 and 2048",
        ));
    }

    check_domain_filter(options.search_domain_filter.as_deref())?;

    Ok(SearchRequestBody {
        query: query.to_string(),
        max_results,
        max_tokens_per_page,
        country: options.country.clone(),
        search_domain_filter: options.search_domain_filter.clone(),
        date_filters: options.date_filters.clone(),
        search_language_filter: options.search_language_filter.clone(),
        user_location: options.user_location.clone(),
    })
}

// ============================================================================
// Agent (`/v1/responses`)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AgentPreset {
    FastSearch,
    ProSearch,
    DeepResearch,
    AdvancedDeepResearch,
}

/// Body of `POST /v1/responses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentRequestBody {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<AgentPreset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Map<String, Value>>,
}

pub fn build_agent_body(args: &RawArguments) -> ApiResult<AgentRequestBody> {
    let query = string_arg(args, "query")
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| {
            ApiError::validation(
                "Invalid arguments for perplexity_agent: 'query' must be a non-empty string",
            )
        })?;

    let models = string_list_arg(args, "models");
    if models.as_ref().is_some_and(|m| m.len() > MAX_AGENT_MODELS) {
        return Err(ApiError::validation(format!(
            "models cannot exceed {MAX_AGENT_MODELS} entries"
        )));
    }

    let max_steps = integer_arg(args, "max_steps");
    if max_steps.is_some_and(|n| !(1..=10).contains(&n)) {
        return Err(ApiError::validation("max_steps must be between 1 and 10"));
    }

    let owned = |key: &str| string_arg(args, key).map(str::to_owned);

    Ok(AgentRequestBody {
        query: query.to_string(),
        model: owned("model"),
        models,
        preset: enum_arg(args, "preset"),
        system: owned("system"),
        instructions: owned("instructions"),
        language: owned("language"),
        max_steps,
        reasoning: object_arg(args, "reasoning"),
        tools: args.get("tools").and_then(Value::as_array).cloned(),
        response_format: object_arg(args, "response_format"),
    })
}

// ============================================================================
// Embeddings
// ============================================================================

/// A single text or a batch of texts to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EncodingFormat {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "base64_int8")]
    Base64Int8,
    #[serde(rename = "base64_binary")]
    Base64Binary,
}

/// Body of `POST /v1/embeddings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingsRequestBody {
    pub input: EmbeddingInput,
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<EncodingFormat>,
}

pub fn build_embeddings_body(args: &RawArguments) -> ApiResult<EmbeddingsRequestBody> {
    let invalid = || {
        ApiError::validation(
            "Invalid arguments for perplexity_embed: 'input' must be a string or array of strings",
        )
    };

    let input = match args.get("input") {
        Some(Value::String(text)) => EmbeddingInput::Single(text.clone()),
        Some(Value::Array(items)) => {
            let texts = items
                .iter()
                .map(|v| v.as_str().map(str::to_owned).ok_or_else(invalid))
                .collect::<ApiResult<Vec<_>>>()?;
            if texts.is_empty() {
                return Err(ApiError::validation(
                    "Invalid arguments for perplexity_embed: 'input' must contain at least one text",
                ));
            }
            if texts.len() > MAX_EMBEDDING_INPUTS {
                return Err(ApiError::validation(format!(
                    "Invalid arguments for perplexity_embed: maximum {MAX_EMBEDDING_INPUTS} inputs allowed"
                )));
            }
            EmbeddingInput::Batch(texts)
        }
        _ => return Err(invalid()),
    };

    let dimensions = integer_arg(args, "dimensions");
    if dimensions.is_some_and(|d| d < 1) {
        return Err(ApiError::validation("dimensions must be at least 1"));
    }

    Ok(EmbeddingsRequestBody {
        input,
        model: string_arg(args, "model")
            .unwrap_or(DEFAULT_EMBEDDING_MODEL)
            .to_string(),
        dimensions,
        encoding_format: enum_arg(args, "encoding_format"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::perplexity::options::{SearchMode, build_common_options};
    use serde_json::json;

    fn args(value: Value) -> RawArguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn messages() -> Vec<Message> {
        vec![Message {
            role: "user".to_string(),
            content: "hello".to_string(),
        }]
    }

    fn domains(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("d{i}.com")).collect()
    }

    #[test]
    fn test_basic_chat_body() {
        let body = build_chat_body(&messages(), "sonar-pro", &CommonOptions::default(), false)
            .unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "sonar-pro",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn test_stream_flag_only_when_requested() {
        let body =
            build_chat_body(&messages(), "sonar", &CommonOptions::default(), true).unwrap();
        assert_eq!(serde_json::to_value(&body).unwrap()["stream"], json!(true));
    }

    #[test]
    fn test_domain_filter_cap() {
        let at_cap = CommonOptions {
            search_domain_filter: Some(domains(20)),
            ..Default::default()
        };
        assert!(build_chat_body(&messages(), "sonar", &at_cap, false).is_ok());

        let over_cap = CommonOptions {
            search_domain_filter: Some(domains(21)),
            ..Default::default()
        };
        let err = build_chat_body(&messages(), "sonar", &over_cap, false).unwrap_err();
        assert!(err.to_string().contains("cannot exceed 20"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_temperature_bounds() {
        for t in [0.0, 2.0, 0.7] {
            let options = CommonOptions {
                temperature: Some(t),
                ..Default::default()
            };
            assert!(validate_options(&options).is_ok(), "temperature {t} rejected");
        }
        for t in [3.0, -1.0, 2.0001] {
            let options = CommonOptions {
                temperature: Some(t),
                ..Default::default()
            };
            let err = validate_options(&options).unwrap_err();
            assert!(err.to_string().contains("between 0 and 2"));
        }
    }

    #[test]
    fn test_other_numeric_bounds() {
        let max_tokens = CommonOptions {
            max_tokens: Some(0),
            ..Default::default()
        };
        assert!(validate_options(&max_tokens)
            .unwrap_err()
            .to_string()
            .contains("at least 1"));

        let top_p = CommonOptions {
            top_p: Some(1.1),
            ..Default::default()
        };
        assert!(validate_options(&top_p)
            .unwrap_err()
            .to_string()
            .contains("between 0 and 1"));

        let top_k = CommonOptions {
            top_k: Some(-1),
            ..Default::default()
        };
        assert!(validate_options(&top_k)
            .unwrap_err()
            .to_string()
            .contains("non-negative"));

        let edges = CommonOptions {
            max_tokens: Some(1),
            top_p: Some(0.0),
            top_k: Some(0),
            ..Default::default()
        };
        assert!(validate_options(&edges).is_ok());
    }

    #[test]
    fn test_fields_are_renamed_and_included_exactly() {
        let options = build_common_options(&args(json!({
            "temperature": 0.5,
            "max_tokens": 100,
            "top_p": 0.9,
            "top_k": 5,
            "search_mode": "academic",
            "search_recency_filter": "week",
            "search_after_date": "01/01/2024",
            "search_before_date": "12/31/2024",
            "last_updated_after": "06/01/2024",
            "last_updated_before": "09/01/2024",
            "return_images": true,
            "return_related_questions": false,
            "disable_search": true,
            "enable_search_classifier": false
        })));
        let body = build_chat_body(&messages(), "sonar", &options, false).unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "sonar",
                "messages": [{ "role": "user", "content": "hello" }],
                "temperature": 0.5,
                "max_tokens": 100,
                "top_p": 0.9,
                "top_k": 5,
                "search_mode": "academic",
                "search_recency_filter": "week",
                "search_after_date_filter": "01/01/2024",
                "search_before_date_filter": "12/31/2024",
                "last_updated_after": "06/01/2024",
                "last_updated_before": "09/01/2024",
                "return_images": true,
                "disable_search": true,
                "enable_search_classifier": false
            })
        );
    }

    #[test]
    fn test_builder_does_not_touch_caller_data() {
        let caller_messages = messages();
        let options = CommonOptions {
            search_domain_filter: Some(vec!["a.com".to_string(), "-b.com".to_string()]),
            search_mode: Some(SearchMode::Web),
            ..Default::default()
        };
        let snapshot = options.clone();

        let mut body = build_chat_body(&caller_messages, "sonar", &options, false).unwrap();
        body.options
            .search_domain_filter
            .as_mut()
            .unwrap()
            .push("c.com".to_string());

        assert_eq!(options, snapshot);
        assert_eq!(caller_messages, messages());
    }

    #[test]
    fn test_async_body_forwards_only_effort_and_domains() {
        let options = build_common_options(&args(json!({
            "reasoning_effort": "low",
            "search_domain_filter": ["arxiv.org"],
            "temperature": 1.0
        })));
        let body = build_async_research_body(&messages(), &options).unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "sonar-deep-research",
                "messages": [{ "role": "user", "content": "hello" }],
                "reasoning_effort": "low",
                "search_domain_filter": ["arxiv.org"]
            })
        );
    }

    #[test]
    fn test_batch_query_bounds() {
        assert_eq!(
            batch_queries(&SearchQuery::Single("rust".to_string())).unwrap(),
            vec!["rust".to_string()]
        );

        let err = batch_queries(&SearchQuery::Batch(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "At least one query is required");

        let six = SearchQuery::Batch((0..6).map(|i| format!("q{i}")).collect());
        let err = batch_queries(&six).unwrap_err();
        assert_eq!(err.to_string(), "Maximum 5 queries per request");

        let five = SearchQuery::Batch((0..5).map(|i| format!("q{i}")).collect());
        assert_eq!(batch_queries(&five).unwrap().len(), 5);
    }

    #[test]
    fn test_search_query_from_args() {
        assert!(SearchQuery::from_args(&args(json!({ "query": ["a", 1] }))).is_err());
        assert!(SearchQuery::from_args(&args(json!({}))).is_err());
        assert_eq!(
            SearchQuery::from_args(&args(json!({ "query": ["a", "b"] }))).unwrap(),
            SearchQuery::Batch(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_search_body_defaults_and_renames() {
        let options = build_search_options(&args(json!({
            "country": "US",
            "search_before_date": "03/01/2025",
            "search_recency_filter": "month",
            "max_results": "ten"
        })));
        let body = build_search_body("rust async", &options).unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "query": "rust async",
                "max_results": 10,
                "max_tokens_per_page": 1024,
                "country": "US",
                "search_recency_filter": "month",
                "search_before_date_filter": "03/01/2025"
            })
        );
    }

    #[test]
    fn test_search_body_ranges() {
        let too_many = SearchOptions {
            max_results: Some(21),
            ..Default::default()
        };
        assert!(build_search_body("q", &too_many).is_err());

        let tiny_pages = SearchOptions {
            max_tokens_per_page: Some(100),
            ..Default::default()
        };
        assert!(build_search_body("q", &tiny_pages).is_err());

        let domains = SearchOptions {
            search_domain_filter: Some(domains(21)),
            ..Default::default()
        };
        assert!(build_search_body("q", &domains).is_err());
    }

    #[test]
    fn test_agent_body() {
        let body = build_agent_body(&args(json!({
            "query": "compare rust web frameworks",
            "preset": "pro-search",
            "max_steps": 3,
            "models": ["openai/gpt-5.2", 7],
            "reasoning": { "effort": "high" },
            "stream": true
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "query": "compare rust web frameworks",
                "models": ["openai/gpt-5.2"],
                "preset": "pro-search",
                "max_steps": 3,
                "reasoning": { "effort": "high" }
            })
        );
    }

    #[test]
    fn test_agent_body_validation() {
        assert!(build_agent_body(&args(json!({ "query": "   " }))).is_err());
        assert!(build_agent_body(&args(json!({ "query": "q", "max_steps": 11 }))).is_err());
        assert!(
            build_agent_body(&args(json!({
                "query": "q",
                "models": ["a", "b", "c", "d", "e", "f"]
            })))
            .is_err()
        );
        let unknown_preset = build_agent_body(&args(json!({ "query": "q", "preset": "turbo" })))
            .unwrap();
        assert!(unknown_preset.preset.is_none());
    }

    #[test]
    fn test_embeddings_body() {
        let body = build_embeddings_body(&args(json!({
            "input": ["a", "b"],
            "dimensions": 256,
            "encoding_format": "base64_int8"
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "input": ["a", "b"],
                "model": "pplx-embed-v1-4b",
                "dimensions": 256,
                "encoding_format": "base64_int8"
            })
        );
    }

    #[test]
    fn test_embeddings_body_validation() {
        assert!(build_embeddings_body(&args(json!({ "input": 3 }))).is_err());
        assert!(build_embeddings_body(&args(json!({ "input": ["ok", 3] }))).is_err());
        assert!(build_embeddings_body(&args(json!({ "input": [] }))).is_err());
        assert!(build_embeddings_body(&args(json!({ "input": "x", "dimensions": 0 }))).is_err());

        let too_many: Vec<String> = (0..513).map(|i| i.to_string()).collect();
        let err = build_embeddings_body(&args(json!({ "input": too_many }))).unwrap_err();
        assert!(err.to_string().contains("maximum 512 inputs"));
    }
}
