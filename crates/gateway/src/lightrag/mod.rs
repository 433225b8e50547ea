//! LightRAG backend access
//!
//! The typed HTTP client, its error type, and the streaming query decoder.

pub mod client;
pub mod error;
pub mod stream;

pub use client::{LightRagClient, API_KEY_HEADER, DEFAULT_TIMEOUT};
pub use error::{LightRagError, LightRagResult};
pub use stream::QueryStream;
