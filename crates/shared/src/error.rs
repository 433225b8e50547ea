//! Error taxonomy shared by the gateway front-ends
//!
//! `ErrorKind` is the machine-readable tag every failure carries across a
//! transport boundary. `ErrorEnvelope` is the wire shape of a failure: it is
//! what RPC callers find inside an `isError` result and what HTTP callers
//! find under `details`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure category, independent of transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing arguments; never sent to the backend
    ValidationError,
    /// Backend rejected the credential (401/403)
    AuthError,
    /// Backend 404, unknown tool, or unroutable prefix
    NotFound,
    /// Backend 408 or local timeout expiry
    Timeout,
    /// Backend 5xx
    ServerError,
    /// Transport-level failure reaching the backend
    ConnectionError,
    /// Any other non-2xx status, or an unreadable body
    ApiError,
}

impl ErrorKind {
    /// Connection and timeout failures may succeed when retried by the caller
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ConnectionError | ErrorKind::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::ApiError => "ApiError",
        }
    }

    /// Classify a non-2xx backend status code
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::ValidationError,
            401 | 403 => ErrorKind::AuthError,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::ApiError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized description of a failed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    /// Set when the kind is worth retrying from the caller's side
    pub retryable: bool,
    /// Tool the failure belongs to, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            response_data: None,
            retryable: kind.is_retryable(),
            tool: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (400, ErrorKind::ValidationError),
            (401, ErrorKind::AuthError),
            (403, ErrorKind::AuthError),
            (404, ErrorKind::NotFound),
            (408, ErrorKind::Timeout),
            (422, ErrorKind::ValidationError),
            (429, ErrorKind::ApiError),
            (500, ErrorKind::ServerError),
            (503, ErrorKind::ServerError),
            (599, ErrorKind::ServerError),
            (418, ErrorKind::ApiError),
            (302, ErrorKind::ApiError),
        ];

        for (status, expected) in cases {
            assert_eq!(ErrorKind::from_status(status), expected, "status {}", status);
        }
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::ConnectionError.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::ValidationError.is_retryable());
        assert!(!ErrorKind::AuthError.is_retryable());
        assert!(!ErrorKind::ServerError.is_retryable());
    }

    #[test]
    fn test_envelope_serialization_omits_empty_fields() {
        let envelope = ErrorEnvelope::new(ErrorKind::ValidationError, "bad input");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["kind"], "ValidationError");
        assert_eq!(json["message"], "bad input");
        assert_eq!(json["retryable"], false);
        assert!(json.get("status_code").is_none());
        assert!(json.get("response_data").is_none());
        assert!(json.get("tool").is_none());
    }
}
