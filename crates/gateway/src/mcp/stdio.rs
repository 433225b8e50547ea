//! Stdio MCP server
//!
//! Newline-delimited JSON-RPC over stdin/stdout. Requests are handled one at
//! a time, in arrival order: a slow backend call blocks the next line until
//! it completes. Nothing but protocol frames is ever written to the output.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::types::*;
use crate::tools::{
    execute_tool, log_tool_failure, tool_descriptors, validate_descriptors, RegistryError, ToolExecutor,
    ToolPrefix,
};

/// Name reported in `initialize`
pub const SERVER_NAME: &str = "lightrag-mcp-gateway";

/// MCP methods understood by the stdio server
#[derive(Debug, Clone, PartialEq)]
pub enum McpMethod {
    Initialize,
    Notification,
    Ping,
    ToolsList,
    ToolsCall,
    Unknown,
}

impl McpMethod {
    pub fn from_name(method: &str) -> Self {
        match method {
            "initialize" => McpMethod::Initialize,
            "ping" => McpMethod::Ping,
            "tools/list" => McpMethod::ToolsList,
            "tools/call" => McpMethod::ToolsCall,
            m if m.starts_with("notifications/") => McpMethod::Notification,
            _ => McpMethod::Unknown,
        }
    }
}

/// Stdio front-end over a single backend
pub struct StdioServer {
    executor: Arc<dyn ToolExecutor>,
    prefix: ToolPrefix,
    tools: Vec<Tool>,
}

impl StdioServer {
    /// Build the server and its prefixed tool listing.
    ///
    /// A malformed catalogue is rejected here, before any request is read.
    pub fn new(executor: Arc<dyn ToolExecutor>, prefix: ToolPrefix) -> Result<Self, RegistryError> {
        let descriptors = prefix.prefix_tools(tool_descriptors());
        validate_descriptors(&descriptors)?;

        tracing::info!(
            tools = descriptors.len(),
            prefix = %prefix.as_str(),
            "Tool catalogue ready"
        );

        Ok(Self {
            executor,
            prefix,
            tools: descriptors.into_iter().map(Tool::from).collect(),
        })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn run(&self) -> std::io::Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    /// Serve frames from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Frame is not valid UTF-8");
                    Some(JsonRpcResponse::error(
                        None,
                        JsonRpcError::parse_error(format!("Parse error: {}", e)),
                    ))
                }
            };

            if let Some(response) = response {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, stopping stdio server");
        Ok(())
    }

    /// Handle one raw frame; `None` means no reply is due
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable frame");
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {}", e)),
                ));
            }
        };

        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<JsonRpcId>(id).ok());

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
            )),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let method = McpMethod::from_name(&request.method);
        tracing::debug!(method = %request.method, "Handling request");

        if method == McpMethod::Notification || request.is_notification() {
            return None;
        }

        let id = request.id.clone();
        let response = match method {
            McpMethod::Initialize => match serde_json::to_value(InitializeResult::for_server(SERVER_NAME)) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
            },
            McpMethod::Ping => JsonRpcResponse::success(id, json!({})),
            McpMethod::ToolsList => {
                let result = ToolsListResult {
                    tools: self.tools.clone(),
                };
                match serde_json::to_value(result) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
                }
            }
            McpMethod::ToolsCall => {
                let params = request
                    .params
                    .map(serde_json::from_value::<ToolCallParams>)
                    .transpose();
                match params {
                    Ok(Some(params)) => {
                        let result = self.call_tool(&params.name, params.arguments).await;
                        match serde_json::to_value(result) {
                            Ok(result) => JsonRpcResponse::success(id, result),
                            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
                        }
                    }
                    Ok(None) => JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params")),
                    Err(e) => JsonRpcResponse::error(id, JsonRpcError::invalid_params(format!("Invalid params: {}", e))),
                }
            }
            McpMethod::Notification | McpMethod::Unknown => {
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method))
            }
        };

        Some(response)
    }

    /// Strip the prefix, validate, dispatch, and wrap the outcome.
    ///
    /// Streaming tools are drained here and returned as one
    /// `streaming_response` value.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        let tool = self.prefix.remove_prefix(name);
        tracing::info!(tool = %tool, requested = %name, "Tool call");

        let outcome = match execute_tool(self.executor.as_ref(), tool, arguments).await {
            Ok(output) => output.into_value().await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(value) => ToolCallResult::json(&value),
            Err(err) => {
                log_tool_failure(tool, &err);
                ToolCallResult::error(&err.to_envelope().with_tool(tool))
            }
        }
    }
}
