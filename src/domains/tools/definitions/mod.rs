//! Tool definitions module.
//!
//! One file per tool; the three chat-completion tools share the `chat`
//! submodule.

pub mod agent;
pub mod chat;
pub mod common;
pub mod embed;
pub mod research_async;
pub mod search;

pub use agent::{AgentParams, AgentTool};
pub use chat::{AskParams, AskTool, ReasonParams, ReasonTool, ResearchParams, ResearchTool};
pub use embed::{EmbedParams, EmbedTool};
pub use research_async::{
    ResearchAsyncParams, ResearchAsyncTool, ResearchStatusParams, ResearchStatusTool,
};
pub use search::{SearchParams, SearchTool};
