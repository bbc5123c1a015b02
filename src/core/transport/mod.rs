//! Transport layer for the MCP server.
//!
//! The server speaks MCP over standard input/output only.

mod error;
pub mod stdio;

pub use error::TransportError;
pub use stdio::StdioTransport;
