//! Argument normalization for Perplexity tool calls.
//!
//! Tool arguments arrive as an untyped JSON map. Each recognized key is read
//! through a small extraction helper that yields `Some` only for a
//! well-typed value; anything else is treated as absent. The helpers are
//! composed in [`build_common_options`], which never fails: range checks
//! happen later, in the request builders.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, ApiResult};
use super::types::Message;

/// Untyped arguments of a single tool invocation.
pub type RawArguments = Map<String, Value>;

/// `chrono` format of the `MM/DD/YYYY` date filters.
pub const DATE_FILTER_FORMAT: &str = "%m/%d/%Y";

// ============================================================================
// Closed value sets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Web,
    Academic,
    Sec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecencyFilter {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Minimal,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    Full,
    Concise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Fast,
    Pro,
}

// ============================================================================
// Normalized options
// ============================================================================

/// Recency and date-range filters shared by chat and search requests.
///
/// The serialized form is the upstream wire form: the two publication-date
/// fields gain a `_filter` suffix, the last-updated fields do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<RecencyFilter>,

    #[serde(
        rename = "search_after_date_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_after_date: Option<String>,

    #[serde(
        rename = "search_before_date_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_before_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_after: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_before: Option<String>,
}

impl DateFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Options common to every chat-completion tool.
///
/// A field is `Some` only when the caller supplied a well-typed value; `None`
/// means "no opinion". The three boolean switches collapse `false` and
/// absent into the same state: only `true` is ever sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommonOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,

    #[serde(flatten)]
    pub date_filters: DateFilters,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub return_images: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub return_related_questions: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<SearchContextSize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_level: Option<OutputLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_language_filter: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_search_classifier: Option<bool>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_search: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SearchType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Map<String, Value>>,
}

impl CommonOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Build [`CommonOptions`] from raw tool arguments.
///
/// Unknown keys, wrong types and values outside an enum's closed set are
/// dropped silently.
pub fn build_common_options(args: &RawArguments) -> CommonOptions {
    CommonOptions {
        reasoning_effort: enum_arg(args, "reasoning_effort"),
        search_domain_filter: string_list_arg(args, "search_domain_filter"),
        temperature: float_arg(args, "temperature"),
        max_tokens: integer_arg(args, "max_tokens"),
        top_p: float_arg(args, "top_p"),
        top_k: integer_arg(args, "top_k"),
        search_mode: enum_arg(args, "search_mode"),
        date_filters: build_date_filters(args),
        return_images: flag_arg(args, "return_images"),
        return_related_questions: flag_arg(args, "return_related_questions"),
        search_context_size: enum_arg(args, "search_context_size"),
        output_level: enum_arg(args, "output_level"),
        search_language_filter: string_list_arg(args, "search_language_filter"),
        enable_search_classifier: bool_arg(args, "enable_search_classifier"),
        disable_search: flag_arg(args, "disable_search"),
        search_type: enum_arg(args, "search_type"),
        response_format: object_arg(args, "response_format"),
    }
}

/// Build the recency/date filters from raw tool arguments.
pub fn build_date_filters(args: &RawArguments) -> DateFilters {
    DateFilters {
        search_recency_filter: enum_arg(args, "search_recency_filter"),
        search_after_date: date_arg(args, "search_after_date"),
        search_before_date: date_arg(args, "search_before_date"),
        last_updated_after: date_arg(args, "last_updated_after"),
        last_updated_before: date_arg(args, "last_updated_before"),
    }
}

/// Read the required `messages` array.
///
/// Unlike optional fields, a missing or malformed conversation is an error.
pub fn parse_messages(args: &RawArguments, tool: &str) -> ApiResult<Vec<Message>> {
    let Some(items) = args.get("messages").and_then(Value::as_array) else {
        return Err(ApiError::validation(format!(
            "Invalid arguments for {tool}: 'messages' must be an array"
        )));
    };

    items
        .iter()
        .map(|item| {
            let role = item.get("role").and_then(Value::as_str);
            let content = item.get("content").and_then(Value::as_str);
            match (role, content) {
                (Some(role), Some(content)) => Ok(Message {
                    role: role.to_string(),
                    content: content.to_string(),
                }),
                _ => Err(ApiError::validation(
                    "Invalid message format: each message must have string 'role' and 'content' properties",
                )),
            }
        })
        .collect()
}

/// Whether `value` is a real calendar date written as `MM/DD/YYYY`.
pub fn is_filter_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 2 || i == 5 { *b == b'/' } else { b.is_ascii_digit() });

    shaped && NaiveDate::parse_from_str(value, DATE_FILTER_FORMAT).is_ok()
}

// ============================================================================
// Per-field extraction
// ============================================================================

pub(crate) fn string_arg<'a>(args: &'a RawArguments, key: &str) -> Option<&'a str> {
    args.get(key)?.as_str()
}

pub(crate) fn float_arg(args: &RawArguments, key: &str) -> Option<f64> {
    args.get(key)?.as_f64()
}

pub(crate) fn integer_arg(args: &RawArguments, key: &str) -> Option<i64> {
    args.get(key)?.as_i64()
}

pub(crate) fn bool_arg(args: &RawArguments, key: &str) -> Option<bool> {
    args.get(key)?.as_bool()
}

/// `true` only for a literal JSON `true`.
pub(crate) fn flag_arg(args: &RawArguments, key: &str) -> bool {
    matches!(args.get(key), Some(Value::Bool(true)))
}

/// Exact, case-sensitive membership in the closed set described by `E`.
pub(crate) fn enum_arg<E: DeserializeOwned>(args: &RawArguments, key: &str) -> Option<E> {
    let raw = string_arg(args, key)?;
    serde_json::from_value(Value::String(raw.to_owned())).ok()
}

/// String elements of an array argument; an array left empty counts as absent.
pub(crate) fn string_list_arg(args: &RawArguments, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = args
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();

    if items.is_empty() { None } else { Some(items) }
}

pub(crate) fn object_arg(args: &RawArguments, key: &str) -> Option<Map<String, Value>> {
    args.get(key)?.as_object().cloned()
}

fn date_arg(args: &RawArguments, key: &str) -> Option<String> {
    string_arg(args, key)
        .filter(|s| is_filter_date(s))
        .map(str::to_owned)
}
