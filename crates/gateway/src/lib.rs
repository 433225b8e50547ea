//! LightRAG MCP Gateway Library
//!
//! Exposes a LightRAG knowledge-graph backend as a catalogue of tools, over
//! MCP stdio JSON-RPC or plain HTTP.

pub mod config;
pub mod error;
pub mod lightrag;
pub mod mcp;
pub mod routes;
pub mod state;
pub mod tools;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use lightrag::{LightRagClient, LightRagError, LightRagResult};
pub use state::{AppState, ClientTable};
