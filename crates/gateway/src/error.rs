//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use lightrag_mcp_shared::{ErrorEnvelope, ErrorKind};

use crate::lightrag::LightRagError;

/// HTTP front-end error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend, validation or dispatch failure for a named tool
    #[error("{source}")]
    Tool { tool: String, source: LightRagError },

    /// Tool name in the path does not carry the route's prefix
    #[error("Tool '{tool}' does not match prefix '{prefix}'")]
    PrefixMismatch { prefix: String, tool: String },

    /// No client for the prefix and no default configured
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn tool(tool: impl Into<String>, source: LightRagError) -> Self {
        ApiError::Tool {
            tool: tool.into(),
            source,
        }
    }

    /// Wire envelope carried in the `details` field
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ApiError::Tool { tool, source } => source.to_envelope().with_tool(tool.clone()),
            ApiError::PrefixMismatch { tool, .. } => {
                ErrorEnvelope::new(ErrorKind::ValidationError, self.to_string()).with_tool(tool.clone())
            }
            ApiError::UnknownPrefix(_) => ErrorEnvelope::new(ErrorKind::NotFound, self.to_string()),
            ApiError::BadRequest(_) => ErrorEnvelope::new(ErrorKind::ValidationError, self.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Tool { source, .. } => match source.kind {
                ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
                ErrorKind::AuthError => source
                    .status_code
                    .filter(|code| *code == 401 || *code == 403)
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(StatusCode::UNAUTHORIZED),
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::ServerError | ErrorKind::ConnectionError | ErrorKind::ApiError => StatusCode::BAD_GATEWAY,
            },
            ApiError::PrefixMismatch { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownPrefix(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Tool { source, .. } => source.message.clone(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "details": self.envelope(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;
