//! Perplexity API domain.
//!
//! Arguments flow through this module in one direction:
//! options (normalize) → request (validate and build) → client (send) →
//! stream (assemble SSE, when streaming) → format (render text).

pub mod client;
pub mod error;
pub mod format;
pub mod options;
pub mod request;
pub mod stream;
pub mod types;

pub use client::{Endpoint, PerplexityClient};
pub use error::{ApiError, ApiResult};
pub use format::Extras;
pub use options::{CommonOptions, RawArguments};
