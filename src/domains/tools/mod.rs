//! Tools domain module.
//!
//! Eight tools expose the Perplexity API to MCP clients.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Central dispatch and error rendering
//! - `router.rs` - rmcp ToolRouter built on top of the registry
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a params struct, `execute()`,
//!    `to_tool()` and `create_route()`
//! 2. Export it in `definitions/mod.rs`
//! 3. Add it to `tool_names()`, `get_all_tools()` and `dispatch()` in `registry.rs`
//! 4. Add its route in `router.rs`

pub mod definitions;
mod error;
mod registry;
pub mod router;

pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use router::build_tool_router;
