//! MCP front-end
//!
//! The stdio JSON-RPC server and the wire types it speaks, plus the NDJSON
//! event shapes used when the HTTP front-end streams a tool result.
//!
//! # Architecture
//!
//! ```text
//! MCP client --stdio--> StdioServer --+
//!                                     +--> ToolExecutor --> LightRAG backend
//! HTTP client --axum--> routes -------+
//! ```

pub mod stdio;
pub mod streaming;
pub mod types;

pub use stdio::{McpMethod, StdioServer, SERVER_NAME};
pub use streaming::{ndjson_body, ndjson_events, StreamEvent, NDJSON_CONTENT_TYPE};
pub use types::*;
