//! LightRAG MCP Shared Types
//!
//! Backend request/response models and the transport-agnostic error taxonomy
//! used by the gateway front-ends.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
