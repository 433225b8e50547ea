//! Tool layer
//!
//! Everything between a caller's `(name, arguments)` pair and a backend call:
//!
//! ```text
//! prefixed name --> ToolPrefix::remove_prefix --> ToolCall::parse --> ToolExecutor::execute
//!                                                  (validate + type)    (LightRagClient)
//! ```

pub mod call;
pub mod dispatch;
pub mod prefix;
pub mod registry;
pub mod validate;

pub use call::ToolCall;
pub use dispatch::{execute_tool, log_tool_failure, ToolExecutor, ToolOutput};
pub use prefix::{ToolPrefix, PREFIX_SEPARATOR};
pub use registry::{tool_descriptors, validate_descriptors, RegistryError, ToolDescriptor, ToolKind};
pub use validate::{required_arguments, validate_arguments};
