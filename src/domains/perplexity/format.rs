//! Plain-text rendering of upstream payloads.
//!
//! The output of these functions is what MCP clients see, so section
//! headers, numbering and blank lines are kept stable.

use serde_json::Value;
use std::fmt::Write;

use super::types::{
    AsyncResearchResult, AsyncStatus, Embedding, EmbeddingsResponse, Image, SearchResponse,
    SearchResult,
};

/// Side-channel collections that may accompany a chat answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extras {
    pub citations: Option<Vec<String>>,
    pub images: Option<Vec<Image>>,
    pub related_questions: Option<Vec<String>>,
    pub search_results: Option<Vec<SearchResult>>,
}

impl Extras {
    pub fn with_citations(citations: Option<Vec<String>>) -> Self {
        Self {
            citations,
            ..Default::default()
        }
    }
}

/// Outcome of one query within a batch search.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query: String,
    pub result: Result<SearchResponse, String>,
}

/// Append the non-empty extras sections to `content`, in a fixed order:
/// citations, images, related questions, search results.
pub fn append_extras(content: &str, extras: &Extras) -> String {
    let mut out = content.to_string();

    if let Some(citations) = non_empty(&extras.citations) {
        out.push_str("\n\nCitations:\n");
        for (i, citation) in citations.iter().enumerate() {
            let _ = writeln!(out, "[{}] {}", i + 1, citation);
        }
    }

    if let Some(images) = non_empty(&extras.images) {
        out.push_str("\n\nImages:\n");
        for (i, image) in images.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] {} ({}x{}) - Source: {}",
                i + 1,
                image.url,
                image.width,
                image.height,
                image.origin_url
            );
        }
    }

    if let Some(questions) = non_empty(&extras.related_questions) {
        out.push_str("\n\nRelated Questions:\n");
        for (i, question) in questions.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, question);
        }
    }

    if let Some(results) = non_empty(&extras.search_results) {
        out.push_str("\n\nSearch Results:\n");
        for (i, result) in results.iter().enumerate() {
            let _ = write!(out, "[{}] {} \u{2014} {}", i + 1, result.title, result.url);
            if let Some(date) = &result.date {
                let _ = write!(out, " ({date})");
            }
            if let Some(snippet) = &result.snippet {
                let _ = write!(out, "\n    {snippet}");
            }
            out.push('\n');
        }
    }

    out
}

/// Render a single `/search` response.
pub fn format_search_results(response: &SearchResponse) -> String {
    let Some(results) = &response.results else {
        return "No search results found.".to_string();
    };

    let mut out = format!("Found {} search results:\n\n", results.len());
    write_search_items(&mut out, results);
    out
}

/// Render a batch of `/search` responses, one section per query.
///
/// A failed query renders its error in place without affecting the others.
/// A missing `results` field and an empty list render differently.
pub fn format_multi_query_results(outcomes: &[QueryOutcome]) -> String {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let mut section = format!("## Query {}: \"{}\"\n", i + 1, outcome.query);
            match &outcome.result {
                Err(message) => {
                    let _ = writeln!(section, "\n**Error:** {message}");
                }
                Ok(response) => match &response.results {
                    None => section.push_str("\nNo search results found.\n"),
                    Some(results) => {
                        let _ = write!(section, "\nFound {} results:\n\n", results.len());
                        write_search_items(&mut section, results);
                    }
                },
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

fn write_search_items(out: &mut String, results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "{}. **{}**", i + 1, result.title);
        let _ = writeln!(out, "   URL: {}", result.url);
        if let Some(snippet) = &result.snippet {
            let _ = writeln!(out, "   {snippet}");
        }
        if let Some(date) = &result.date {
            let _ = writeln!(out, "   Date: {date}");
        }
        out.push('\n');
    }
}

/// Render an agent (`/v1/responses`) payload.
///
/// Text is taken from the `output` items when present, then from a top-level
/// `content`, then from a chat-style `choices` array. As a last resort the
/// whole payload is pretty-printed.
pub fn format_agent_response(payload: &Value) -> String {
    let body = agent_output_text(payload)
        .or_else(|| {
            payload
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .or_else(|| {
            payload
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| {
            serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
        });

    let citations = payload
        .get("citations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty());

    let search_results = payload
        .get("search_results")
        .and_then(|v| serde_json::from_value::<Vec<SearchResult>>(v.clone()).ok())
        .filter(|items| !items.is_empty());

    let mut out = body;

    if let Some(citations) = citations {
        out.push_str("\n\nCitations:\n");
        for (i, citation) in citations.iter().enumerate() {
            let _ = writeln!(out, "[{}] {}", i + 1, citation);
        }
    }

    if let Some(results) = search_results {
        out.push_str("\n\nSearch Results:\n");
        for (i, result) in results.iter().enumerate() {
            let _ = write!(out, "[{}] {} \u{2014} {}", i + 1, result.title, result.url);
            if let Some(date) = &result.date {
                let _ = write!(out, " ({date})");
            }
            out.push('\n');
        }
    }

    out
}

fn agent_output_text(payload: &Value) -> Option<String> {
    let parts: Vec<String> = payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| {
            if let Some(text) = item.get("content").and_then(Value::as_str) {
                return Some(text.to_owned());
            }
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                return Some(text.to_owned());
            }
            // Message items nest their text in a content array.
            let nested: Vec<&str> = item
                .get("content")?
                .as_array()?
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            if nested.is_empty() {
                None
            } else {
                Some(nested.join("\n\n"))
            }
        })
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Render an embeddings response, followed by the raw JSON.
pub fn format_embeddings(response: &EmbeddingsResponse) -> String {
    let mut out = format!(
        "Model: {}\nUsage: {} prompt tokens, {} total tokens\nEmbeddings: {}\n\n",
        response.model,
        response.usage.prompt_tokens,
        response.usage.total_tokens,
        response.data.len()
    );

    for item in &response.data {
        match &item.embedding {
            Embedding::Floats(values) => {
                let preview: Vec<String> = values.iter().take(5).map(|v| format!("{v:.6}")).collect();
                let ellipsis = if values.len() > 5 { ", ..." } else { "" };
                let _ = writeln!(
                    out,
                    "[{}] {} dimensions: [{}{}]",
                    item.index,
                    values.len(),
                    preview.join(", "),
                    ellipsis
                );
            }
            Embedding::Encoded(_) => {
                let _ = writeln!(out, "[{}] base64 encoded", item.index);
            }
        }
    }

    let raw = serde_json::to_string_pretty(response).unwrap_or_default();
    let _ = write!(out, "\n---\nRaw JSON:\n{raw}");
    out
}

/// Acknowledgement text for a freshly submitted async research job.
pub fn format_async_started(request_id: &str, status: &str) -> String {
    format!(
        "Async research job started.\n\nRequest ID: {request_id}\nStatus: {status}\n\n\
         Use perplexity_research_status with this request_id to check progress and retrieve results."
    )
}

/// Render a polled async research job.
pub fn format_async_status(result: &AsyncResearchResult) -> String {
    let mut out = format!(
        "Request ID: {}\nStatus: {}",
        result.request_id, result.status
    );

    if let Some(created) = &result.created_at {
        let _ = write!(out, "\nCreated: {created}");
    }
    if let Some(completed) = &result.completed_at {
        let _ = write!(out, "\nCompleted: {completed}");
    }

    match result.status {
        AsyncStatus::Failed => {
            if let Some(error) = &result.error {
                let _ = write!(out, "\nError: {error}");
            }
        }
        AsyncStatus::Completed => {
            if let Some(text) = &result.result {
                let _ = write!(out, "\n\n--- Research Results ---\n\n{text}");
            }
        }
        status if status.is_in_progress() => {
            out.push_str(
                "\n\nThe research is still in progress. Please poll again in a few seconds.",
            );
        }
        _ => {}
    }

    out
}

fn non_empty<T>(items: &Option<Vec<T>>) -> Option<&[T]> {
    items.as_deref().filter(|items| !items.is_empty())
}
