//! Wire types exchanged with the Perplexity API.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::format::Extras;

/// One conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    /// Role of the message (e.g. system, user, assistant).
    #[schemars(description = "Role of the message (e.g., system, user, assistant)")]
    pub role: String,

    /// The content of the message.
    #[schemars(description = "The content of the message")]
    pub content: String,
}

/// An image attached to a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub origin_url: String,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
}

/// A ranked web result, returned by `/search` and alongside completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: Option<u64>,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response of a non-streaming `/chat/completions` call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub citations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub images: Option<Vec<Image>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub related_questions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub search_results: Option<Vec<SearchResult>>,
}

impl ChatResponse {
    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }

    /// Side-channel collections, moved out for rendering.
    pub fn into_extras(self) -> Extras {
        Extras {
            citations: self.citations,
            images: self.images,
            related_questions: self.related_questions,
            search_results: self.search_results,
        }
    }
}

/// Response of the `/search` endpoint.
///
/// `results` stays optional: a missing field renders differently from an
/// empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Option<Vec<SearchResult>>,
}

/// Acknowledgement returned when an async research job is submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncResearchStart {
    pub request_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Lifecycle state of an async research job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AsyncStatus {
    /// Whether the job has not reached a terminal state yet.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl fmt::Display for AsyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Raw payload of `GET /async/chat/completions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncStatusResponse {
    pub request_id: String,
    pub status: AsyncStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub citations: Option<Vec<String>>,
}

/// Polled view of an async research job. The upstream service is the only
/// source of truth; nothing is kept locally between polls.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncResearchResult {
    pub request_id: String,
    pub status: AsyncStatus,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// An embedding vector, either raw floats or a base64 payload depending on
/// the requested encoding format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Embedding {
    Floats(Vec<f64>),
    Encoded(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub embedding: Embedding,
    pub index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Response of the `/v1/embeddings` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub data: Vec<EmbeddingData>,
    pub model: String,
    #[serde(default)]
    pub usage: EmbeddingUsage,
}

/// Decode an optional side-channel list. A malformed list is logged and
/// treated as absent so it cannot sink the answer it accompanies.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(items) => Ok(Some(items)),
        Err(e) => {
            debug!(error = %e, "Ignoring malformed response collection");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_response_distinguishes_missing_results() {
        let missing: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(missing.results.is_none());

        let empty: SearchResponse = serde_json::from_value(json!({ "results": [] })).unwrap();
        assert_eq!(empty.results, Some(vec![]));
    }

    #[test]
    fn test_chat_response_tolerates_odd_extras() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "ok" } }],
            "images": [{ "url": "https://img", "origin_url": "https://src", "height": 480.0, "width": 640.5 }],
            "search_results": [{ "url": "https://x" }],
            "related_questions": "not a list",
            "citations": ["https://c", 7]
        }))
        .unwrap();

        assert_eq!(parsed.first_content(), Some("ok"));
        let images = parsed.images.as_deref().unwrap();
        assert_eq!(images[0].height, 480.0);
        assert_eq!(images[0].width, 640.5);
        assert_eq!(parsed.search_results.as_deref().unwrap()[0].title, "");
        assert!(parsed.related_questions.is_none());
        assert!(parsed.citations.is_none());
    }

    #[test]
    fn test_search_result_without_title() {
        let parsed: SearchResponse =
            serde_json::from_value(json!({ "results": [{ "url": "https://x" }] })).unwrap();
        let results = parsed.results.unwrap();
        assert_eq!(results[0].url, "https://x");
        assert_eq!(results[0].title, "");

        let garbage: SearchResponse =
            serde_json::from_value(json!({ "results": "none" })).unwrap();
        assert!(garbage.results.is_none());
    }

    #[test]
    fn test_async_status_unknown_value() {
        let parsed: AsyncStatusResponse =
            serde_json::from_value(json!({ "request_id": "r1", "status": "queued" })).unwrap();
        assert_eq!(parsed.status, AsyncStatus::Unknown);
        assert!(!parsed.status.is_in_progress());
    }

    #[test]
    fn test_embedding_variants() {
        let floats: EmbeddingData =
            serde_json::from_value(json!({ "embedding": [0.1, 0.2], "index": 0 })).unwrap();
        assert_eq!(floats.embedding, Embedding::Floats(vec![0.1, 0.2]));

        let encoded: EmbeddingData =
            serde_json::from_value(json!({ "embedding": "AAEC", "index": 1 })).unwrap();
        assert_eq!(encoded.embedding, Embedding::Encoded("AAEC".to_string()));
    }
}
