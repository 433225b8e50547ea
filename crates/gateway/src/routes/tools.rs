//! Tool listing and invocation over HTTP
//!
//! `{prefix}` selects the backend and namespaces the catalogue: tools are
//! listed as `{prefix}_{tool}` and must be called by that name.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult},
    lightrag::LightRagError,
    mcp::{ndjson_body, NDJSON_CONTENT_TYPE},
    state::AppState,
    tools::{log_tool_failure, tool_descriptors, ToolCall, ToolDescriptor, ToolOutput, ToolPrefix},
};

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ToolCallBody {
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub prefix: String,
    pub tools: Vec<ToolDescriptor>,
    pub count: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the catalogue as seen under `{prefix}`
pub async fn list_tools(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> ApiResult<Json<ToolListResponse>> {
    if state.clients.resolve(&prefix).is_none() {
        return Err(ApiError::UnknownPrefix(prefix));
    }

    let tools = ToolPrefix::for_route(&prefix).prefix_tools(tool_descriptors());
    Ok(Json(ToolListResponse {
        prefix,
        count: tools.len(),
        tools,
    }))
}

/// Invoke `{tool_name}` against the backend selected by `{prefix}`
pub async fn call_tool(
    State(state): State<AppState>,
    Path((prefix, tool_name)): Path<(String, String)>,
    body: Result<Json<ToolCallBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let route_prefix = ToolPrefix::for_route(&prefix);
    if !route_prefix.has_prefix(&tool_name) {
        tracing::warn!(prefix = %prefix, tool = %tool_name, "Tool name does not match route prefix");
        return Err(ApiError::PrefixMismatch { prefix, tool: tool_name });
    }

    let executor = state
        .clients
        .resolve(&prefix)
        .ok_or_else(|| ApiError::UnknownPrefix(prefix.clone()))?;

    let name = route_prefix.remove_prefix(&tool_name);
    let fail = |err: LightRagError| {
        log_tool_failure(&tool_name, &err);
        ApiError::tool(tool_name.as_str(), err)
    };

    let call = ToolCall::parse(name, body.arguments).map_err(fail)?;
    if body.stream && !call.is_streaming() {
        return Err(fail(LightRagError::validation(format!(
            "Tool '{}' does not support streaming",
            name
        ))));
    }

    tracing::info!(prefix = %prefix, tool = %call.name(), stream = call.is_streaming(), "Tool call");

    let output = executor.execute(call).await.map_err(fail)?;
    match output {
        ToolOutput::Stream(fragments) => Ok(ndjson_response(Body::from_stream(ndjson_body(fragments, tool_name)))),
        ToolOutput::Json(data) => Ok(Json(json!({ "success": true, "data": data })).into_response()),
    }
}

fn ndjson_response(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON_CONTENT_TYPE));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
