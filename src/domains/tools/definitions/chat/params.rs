//! Parameter blocks shared by the chat-completion tools.
//!
//! These structs only describe the published input schema. Execution reads
//! the raw argument map, so a value that does not fit the schema is dropped
//! rather than rejecting the whole call.

use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::domains::perplexity::options::{
    OutputLevel, RecencyFilter, SearchContextSize, SearchMode, SearchType,
};

/// Sampling and search filters accepted by every chat tool.
#[derive(Debug, Clone, Default, JsonSchema)]
pub struct BaseChatParams {
    /// Domain filter list. Prefix with '-' to exclude. Maximum 20 domains.
    #[serde(default)]
    pub search_domain_filter: Option<Vec<String>>,

    /// Controls randomness, from 0 (deterministic) to 2. Default: 0.2
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Maximum tokens in the response (at least 1).
    #[serde(default)]
    pub max_tokens: Option<i64>,

    /// Nucleus sampling threshold, between 0 and 1. Default: 0.9
    #[serde(default)]
    pub top_p: Option<f64>,

    /// Top-k sampling. 0 = disabled. Default: 0
    #[serde(default)]
    pub top_k: Option<i64>,

    /// Source type filter.
    #[serde(default)]
    pub search_mode: Option<SearchMode>,

    /// Filter results by recency.
    #[serde(default)]
    pub search_recency_filter: Option<RecencyFilter>,

    /// Only include results published after this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub search_after_date: Option<String>,

    /// Only include results published before this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub search_before_date: Option<String>,

    /// Only include results last updated after this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub last_updated_after: Option<String>,

    /// Only include results last updated before this date. Format: MM/DD/YYYY
    #[serde(default)]
    pub last_updated_before: Option<String>,
}

/// Extra switches accepted by the ask and reason tools.
#[derive(Debug, Clone, Default, JsonSchema)]
pub struct ExtendedChatParams {
    /// Amount of search context to include.
    #[serde(default)]
    pub search_context_size: Option<SearchContextSize>,

    /// Response detail level.
    #[serde(default)]
    pub output_level: Option<OutputLevel>,

    /// ISO 639-1 language codes to filter search results (max 10).
    #[serde(default)]
    pub search_language_filter: Option<Vec<String>>,

    /// Enable or disable the search classifier.
    #[serde(default)]
    pub enable_search_classifier: Option<bool>,

    /// Disable web search entirely.
    #[serde(default)]
    pub disable_search: Option<bool>,

    /// Search type. 'pro' enables multi-step Pro Search reasoning.
    #[serde(default)]
    pub search_type: Option<SearchType>,

    /// Structured output format (e.g. { type: 'json_schema', json_schema: {...} }).
    #[serde(default)]
    pub response_format: Option<Map<String, Value>>,
}
