//! Backend client error type

use lightrag_mcp_shared::{ErrorEnvelope, ErrorKind};
use serde_json::Value;

/// Failure of a tool call, either local (validation, routing) or from the backend
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LightRagError {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub response_data: Option<Value>,
}

/// Result type for backend and dispatch operations
pub type LightRagResult<T> = Result<T, LightRagError>;

impl LightRagError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            response_data: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::not_found(format!("Unknown tool: {}", name))
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    /// Build the error for a non-2xx backend response.
    ///
    /// The message prefers the backend's `detail` or `message` field and falls
    /// back to the raw body, then to the canonical reason phrase.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let detail = parsed
            .as_ref()
            .and_then(|v| v.get("detail").or_else(|| v.get("message")))
            .map(|d| match d {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.chars().take(500).collect())
            })
            .unwrap_or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        Self {
            kind: ErrorKind::from_status(status),
            message: format!("HTTP {}: {}", status, detail),
            status_code: Some(status),
            response_data: parsed,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Connection and timeout failures are worth retrying from the caller's side
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            kind: self.kind,
            message: self.message.clone(),
            status_code: self.status_code,
            response_data: self.response_data.clone(),
            retryable: self.is_retryable(),
            tool: None,
        }
    }
}

impl From<reqwest::Error> for LightRagError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let mapped = if err.is_timeout() {
            LightRagError::timeout(format!("Request timed out: {}", err))
        } else if err.is_decode() {
            LightRagError::api(format!("Invalid response body: {}", err))
        } else if err.is_connect() || err.is_request() || err.is_body() {
            LightRagError::connection(format!("Failed to reach LightRAG server: {}", err))
        } else {
            LightRagError::connection(format!("HTTP transport error: {}", err))
        };

        match status {
            Some(code) => mapped.with_status(code),
            None => mapped,
        }
    }
}
