//! Tool dispatch
//!
//! `ToolExecutor` is the seam between the front-ends and the backend. The
//! LightRAG client implements it with one arm per `ToolCall` variant; tests
//! substitute a spy to observe (or rule out) backend traffic.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use lightrag_mcp_shared::ErrorKind;

use super::call::ToolCall;
use crate::lightrag::{LightRagClient, LightRagError, LightRagResult, QueryStream};

/// Result of a dispatched tool call
#[derive(Debug)]
pub enum ToolOutput {
    Json(Value),
    Stream(QueryStream),
}

impl ToolOutput {
    pub fn json<T: Serialize>(value: &T) -> LightRagResult<Self> {
        serde_json::to_value(value)
            .map(ToolOutput::Json)
            .map_err(|e| LightRagError::api(format!("Failed to encode result: {}", e)))
    }

    /// Buffer the output into one JSON value, draining streams
    pub async fn into_value(self) -> LightRagResult<Value> {
        match self {
            ToolOutput::Json(value) => Ok(value),
            ToolOutput::Stream(stream) => {
                let text = stream.collect_text().await?;
                Ok(json!({ "streaming_response": text }))
            }
        }
    }
}

/// Executes validated tool calls against a backend
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: ToolCall) -> LightRagResult<ToolOutput>;
}

/// Parse, validate and execute `name` with `arguments`.
///
/// `name` must already be unprefixed. Validation failures return before the
/// executor is touched.
pub async fn execute_tool(
    executor: &dyn ToolExecutor,
    name: &str,
    arguments: Value,
) -> LightRagResult<ToolOutput> {
    let call = ToolCall::parse(name, arguments)?;
    tracing::debug!(tool = %call.name(), "Dispatching tool call");
    executor.execute(call).await
}

/// Log a failed call at a level matching its kind
pub fn log_tool_failure(tool: &str, err: &LightRagError) {
    match err.kind {
        ErrorKind::ValidationError | ErrorKind::NotFound | ErrorKind::ConnectionError | ErrorKind::Timeout => {
            tracing::warn!(tool = %tool, kind = %err.kind, status = ?err.status_code, "Tool call failed: {}", err.message)
        }
        ErrorKind::AuthError | ErrorKind::ServerError | ErrorKind::ApiError => {
            tracing::error!(tool = %tool, kind = %err.kind, status = ?err.status_code, "Tool call failed: {}", err.message)
        }
    }
}

impl LightRagClient {
    /// Dispatch an unprefixed tool by name
    pub async fn execute_tool(&self, name: &str, arguments: Value) -> LightRagResult<ToolOutput> {
        execute_tool(self, name, arguments).await
    }
}

#[async_trait]
impl ToolExecutor for LightRagClient {
    async fn execute(&self, call: ToolCall) -> LightRagResult<ToolOutput> {
        match call {
            ToolCall::InsertText(request) => ToolOutput::json(&self.insert_text(&request).await?),
            ToolCall::InsertTexts(request) => ToolOutput::json(&self.insert_texts(&request).await?),
            ToolCall::UploadDocument { file_path } => {
                ToolOutput::json(&self.upload_document(&file_path).await?)
            }
            ToolCall::ScanDocuments => ToolOutput::json(&self.scan_documents().await?),
            ToolCall::GetDocuments => ToolOutput::json(&self.get_documents().await?),
            ToolCall::GetDocumentsPaginated(request) => {
                ToolOutput::json(&self.get_documents_paginated(&request).await?)
            }
            ToolCall::DeleteDocument(request) => ToolOutput::json(&self.delete_documents(&request).await?),
            ToolCall::ClearDocuments => ToolOutput::json(&self.clear_documents().await?),
            ToolCall::ReprocessFailedDocuments => {
                ToolOutput::json(&self.reprocess_failed_documents().await?)
            }
            ToolCall::CancelPipeline => ToolOutput::json(&self.cancel_pipeline().await?),
            ToolCall::QueryText(request) => ToolOutput::json(&self.query(&request).await?),
            ToolCall::QueryTextStream(request) => Ok(ToolOutput::Stream(self.query_stream(&request).await?)),
            ToolCall::QueryData(request) => ToolOutput::json(&self.query_data(&request).await?),
            ToolCall::GetKnowledgeGraph {
                label,
                max_depth,
                max_nodes,
            } => ToolOutput::json(&self.get_knowledge_graph(&label, max_depth, max_nodes).await?),
            ToolCall::GetGraphLabels => ToolOutput::json(&self.get_graph_labels().await?),
            ToolCall::SearchGraphLabels { q, limit } => {
                ToolOutput::json(&self.search_graph_labels(&q, limit).await?)
            }
            ToolCall::GetPopularLabels { limit } => ToolOutput::json(&self.get_popular_labels(limit).await?),
            ToolCall::CheckEntityExists { entity_name } => {
                ToolOutput::json(&self.check_entity_exists(&entity_name).await?)
            }
            ToolCall::CreateEntity(request) => ToolOutput::json(&self.create_entity(&request).await?),
            ToolCall::UpdateEntity(request) => ToolOutput::json(&self.update_entity(&request).await?),
            ToolCall::DeleteEntity(request) => ToolOutput::json(&self.delete_entity(&request).await?),
            ToolCall::CreateRelation(request) => ToolOutput::json(&self.create_relation(&request).await?),
            ToolCall::UpdateRelation(request) => ToolOutput::json(&self.update_relation(&request).await?),
            ToolCall::DeleteRelation(request) => ToolOutput::json(&self.delete_relation(&request).await?),
            ToolCall::MergeEntities(request) => ToolOutput::json(&self.merge_entities(&request).await?),
            ToolCall::GetPipelineStatus => ToolOutput::json(&self.get_pipeline_status().await?),
            ToolCall::GetTrackStatus { track_id } => ToolOutput::json(&self.get_track_status(&track_id).await?),
            ToolCall::GetDocumentStatusCounts => {
                ToolOutput::json(&self.get_document_status_counts().await?)
            }
            ToolCall::ClearCache(request) => ToolOutput::json(&self.clear_cache(&request).await?),
            ToolCall::GetHealth => ToolOutput::json(&self.get_health().await?),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tools::registry::{tool_descriptors, ToolKind};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal valid arguments for each tool
    fn minimal_arguments(kind: ToolKind) -> Value {
        match kind {
            ToolKind::InsertText => json!({"text": "hello"}),
            ToolKind::InsertTexts => json!({"texts": ["hello"]}),
            ToolKind::UploadDocument => json!({"file_path": concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")}),
            ToolKind::GetDocumentsPaginated => json!({"page": 1, "page_size": 10}),
            ToolKind::DeleteDocument => json!({"document_id": "doc-1"}),
            ToolKind::QueryText | ToolKind::QueryTextStream | ToolKind::QueryData => json!({"query": "hi"}),
            ToolKind::SearchGraphLabels => json!({"q": "a"}),
            ToolKind::CheckEntityExists | ToolKind::DeleteEntity => json!({"entity_name": "Alice"}),
            ToolKind::CreateEntity => json!({"entity_name": "Alice", "entity_data": {}}),
            ToolKind::UpdateEntity => json!({"entity_name": "Alice", "updated_data": {}}),
            ToolKind::CreateRelation => {
                json!({"source_entity": "Alice", "target_entity": "Bob", "relation_data": {}})
            }
            ToolKind::UpdateRelation => json!({"source_id": "Alice", "target_id": "Bob", "updated_data": {}}),
            ToolKind::DeleteRelation => json!({"source_entity": "Alice", "target_entity": "Bob"}),
            ToolKind::MergeEntities => json!({"entities_to_change": ["Al"], "entity_to_change_into": "Alice"}),
            ToolKind::GetTrackStatus => json!({"track_id": "t-1"}),
            _ => json!({}),
        }
    }

    struct CountingExecutor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolExecutor for CountingExecutor {
        async fn execute(&self, call: ToolCall) -> LightRagResult<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::Json(json!({ "tool": call.name() })))
        }
    }

    #[test]
    fn test_registry_dispatch_parity() {
        let listed: BTreeSet<String> = tool_descriptors().into_iter().map(|t| t.name).collect();

        let dispatchable: BTreeSet<String> = listed
            .iter()
            .filter_map(|name| {
                let kind = ToolKind::from_name(name)?;
                let call = ToolCall::parse(name, minimal_arguments(kind)).ok()?;
                Some(call.name().to_string())
            })
            .collect();

        assert_eq!(listed, dispatchable);
        assert_eq!(listed.len(), ToolKind::ALL.len());
    }

    #[tokio::test]
    async fn test_validation_failure_skips_executor() {
        let executor = CountingExecutor {
            calls: AtomicUsize::new(0),
        };

        for kind in ToolKind::ALL {
            if crate::tools::validate::required_arguments(kind).is_empty() {
                continue;
            }
            let err = execute_tool(&executor, kind.as_str(), json!({})).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::ValidationError, "tool {}", kind);
        }

        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_call_reaches_executor() {
        let executor = CountingExecutor {
            calls: AtomicUsize::new(0),
        };
        let output = execute_tool(&executor, "get_health", json!({})).await.unwrap();
        assert_eq!(output.into_value().await.unwrap(), json!({"tool": "get_health"}));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_output_buffers_to_streaming_response() {
        let stream = QueryStream::from_stream(futures::stream::iter(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
        ]));
        let value = ToolOutput::Stream(stream).into_value().await.unwrap();
        assert_eq!(value, json!({"streaming_response": "ab"}));
    }

    #[tokio::test]
    async fn test_client_dispatch_hits_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/graph/entity/exists")
            .match_query(mockito::Matcher::UrlEncoded("name".into(), "Alice".into()))
            .with_status(200)
            .with_body(r#"{"exists": true}"#)
            .create_async()
            .await;

        let client = LightRagClient::new(&server.url(), None, crate::lightrag::DEFAULT_TIMEOUT).unwrap();
        let output = client
            .execute_tool("check_entity_exists", json!({"entity_name": "Alice"}))
            .await
            .unwrap();

        assert_eq!(output.into_value().await.unwrap(), json!({"exists": true}));
        mock.assert_async().await;
    }
}
