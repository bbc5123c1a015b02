//! `perplexity_embed` tool definition (`POST /v1/embeddings`).

use rmcp::{
    handler::server::tool::{ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domains::perplexity::format::format_embeddings;
use crate::domains::perplexity::request::{EmbeddingInput, EncodingFormat, build_embeddings_body};
use crate::domains::perplexity::{PerplexityClient, RawArguments};
use crate::domains::tools::ToolRegistry;
use crate::domains::tools::definitions::common::registry_route;
use crate::domains::tools::error::ToolResult;

/// Embedding models advertised in the schema. Other names are passed through
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum EmbeddingModel {
    #[serde(rename = "pplx-embed-v1-0.6b")]
    EmbedSmall,
    #[serde(rename = "pplx-embed-v1-4b")]
    EmbedLarge,
    #[serde(rename = "pplx-embed-context-v1-0.6b")]
    ContextSmall,
    #[serde(rename = "pplx-embed-context-v1-4b")]
    ContextLarge,
}

/// Parameters for the embed tool.
#[derive(Debug, Clone, JsonSchema)]
pub struct EmbedParams {
    /// Text or array of texts (max 512) to generate embeddings for.
    pub input: EmbeddingInput,

    /// Embedding model. Default: pplx-embed-v1-4b
    #[serde(default)]
    pub model: Option<EmbeddingModel>,

    /// Output dimensions (Matryoshka dimensionality reduction). Omit for full
    /// dimensions.
    #[serde(default)]
    pub dimensions: Option<i64>,

    /// Encoding format for embeddings. Default: float
    #[serde(default)]
    pub encoding_format: Option<EncodingFormat>,
}

pub struct EmbedTool;

impl EmbedTool {
    pub const NAME: &'static str = "perplexity_embed";

    pub const DESCRIPTION: &'static str = "Generate text embeddings using the Perplexity Embeddings API. \
        Supports 4 models, batch input (up to 512 texts), Matryoshka dimensionality reduction, and multiple encoding formats.";

    #[instrument(skip_all)]
    pub async fn execute(args: &RawArguments, client: &PerplexityClient) -> ToolResult<String> {
        let body = build_embeddings_body(args)?;
        let inputs = match &body.input {
            EmbeddingInput::Single(_) => 1,
            EmbeddingInput::Batch(texts) => texts.len(),
        };
        info!(model = %body.model, inputs, "Embed tool called");

        let response = client.embeddings(&body).await?;
        Ok(format_embeddings(&response))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<EmbedParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(registry: Arc<ToolRegistry>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        registry_route(Self::to_tool(), registry)
    }
}
