//! Domains module containing business logic organized by bounded contexts.
//!
//! `perplexity` talks to the upstream API; `tools` turns MCP tool calls into
//! calls against it.

pub mod perplexity;
pub mod tools;
