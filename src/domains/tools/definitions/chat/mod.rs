//! Chat-completion tools: ask, research and reason.
//!
//! The three tools differ only in model choice, streaming support and the
//! options they advertise. They all end in [`complete`].

mod ask;
mod params;
mod reason;
mod research;

pub use ask::{AskModel, AskParams, AskTool};
pub use params::{BaseChatParams, ExtendedChatParams};
pub use reason::{ReasonParams, ReasonTool};
pub use research::{ResearchParams, ResearchTool};

use tracing::debug;

use crate::domains::perplexity::format::append_extras;
use crate::domains::perplexity::request::build_chat_body;
use crate::domains::perplexity::types::Message;
use crate::domains::perplexity::{CommonOptions, PerplexityClient};
use crate::domains::tools::error::ToolResult;

/// Validate, send and render one chat completion.
pub(crate) async fn complete(
    client: &PerplexityClient,
    messages: &[Message],
    model: &str,
    options: &CommonOptions,
    stream: bool,
) -> ToolResult<String> {
    let body = build_chat_body(messages, model, options, stream)?;
    debug!(model, stream, has_options = !options.is_empty(), "Chat body built");

    if stream {
        let assembled = client.chat_completion_stream(&body).await?;
        return Ok(append_extras(&assembled.content, &assembled.extras));
    }

    let response = client.chat_completion(&body).await?;
    let content = response.first_content().unwrap_or_default().to_string();
    Ok(append_extras(&content, &response.into_extras()))
}
