//! Typed tool invocations
//!
//! `ToolCall::parse` is the single boundary between the loosely-typed
//! argument bag a caller sends and the typed backend requests. It validates
//! first, then builds exactly one variant per tool.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use lightrag_mcp_shared::types::*;

use super::registry::ToolKind;
use super::validate::{validate_arguments, Arguments};
use crate::lightrag::{LightRagError, LightRagResult};

/// Default label for graph retrieval (whole graph)
pub const DEFAULT_GRAPH_LABEL: &str = "*";

/// Default result count for label search
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Default result count for popular labels
pub const DEFAULT_POPULAR_LIMIT: u32 = 300;

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    InsertText(InsertTextRequest),
    InsertTexts(InsertTextsRequest),
    UploadDocument { file_path: PathBuf },
    ScanDocuments,
    GetDocuments,
    GetDocumentsPaginated(DocumentsRequest),
    DeleteDocument(DeleteDocRequest),
    ClearDocuments,
    ReprocessFailedDocuments,
    CancelPipeline,
    QueryText(QueryRequest),
    QueryTextStream(QueryRequest),
    QueryData(QueryRequest),
    GetKnowledgeGraph {
        label: String,
        max_depth: Option<u32>,
        max_nodes: Option<u32>,
    },
    GetGraphLabels,
    SearchGraphLabels { q: String, limit: u32 },
    GetPopularLabels { limit: u32 },
    CheckEntityExists { entity_name: String },
    CreateEntity(CreateEntityRequest),
    UpdateEntity(EntityUpdateRequest),
    DeleteEntity(DeleteEntityRequest),
    CreateRelation(CreateRelationRequest),
    UpdateRelation(RelationUpdateRequest),
    DeleteRelation(DeleteRelationRequest),
    MergeEntities(EntityMergeRequest),
    GetPipelineStatus,
    GetTrackStatus { track_id: String },
    GetDocumentStatusCounts,
    ClearCache(ClearCacheRequest),
    GetHealth,
}

impl ToolCall {
    /// Parse an unprefixed tool name and its argument bag.
    ///
    /// Unknown names fail with `NotFound`; anything else wrong with the
    /// arguments fails with `ValidationError`. No I/O happens here.
    pub fn parse(name: &str, arguments: Value) -> LightRagResult<Self> {
        let kind = ToolKind::from_name(name).ok_or_else(|| LightRagError::unknown_tool(name))?;

        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(LightRagError::validation(format!(
                    "Arguments for {} must be a JSON object, got {}",
                    name,
                    json_type(&other)
                )))
            }
        };

        let args = validate_arguments(kind, args)?;
        Self::build(kind, &args)
    }

    fn build(kind: ToolKind, args: &Arguments) -> LightRagResult<Self> {
        let call = match kind {
            ToolKind::InsertText => {
                let file_source = match opt_str(args, "title") {
                    Some(title) if !title.trim().is_empty() => format!("{}.txt", title),
                    _ => "text_input.txt".to_string(),
                };
                ToolCall::InsertText(InsertTextRequest {
                    text: req_str(args, "text")?,
                    file_source,
                })
            }
            ToolKind::InsertTexts => ToolCall::InsertTexts(insert_texts(args)?),
            ToolKind::UploadDocument => ToolCall::UploadDocument {
                file_path: PathBuf::from(req_str(args, "file_path")?),
            },
            ToolKind::ScanDocuments => ToolCall::ScanDocuments,
            ToolKind::GetDocuments => ToolCall::GetDocuments,
            ToolKind::GetDocumentsPaginated => {
                let status_filter = opt_str(args, "status_filter")
                    .map(|s| s.parse::<DocStatus>())
                    .transpose()
                    .map_err(|e| LightRagError::validation(format!("Invalid status_filter: {}", e)))?;
                ToolCall::GetDocumentsPaginated(DocumentsRequest {
                    page: req_u32(args, "page")?,
                    page_size: req_u32(args, "page_size")?,
                    status_filter,
                })
            }
            ToolKind::DeleteDocument => {
                let doc_ids = match opt_str(args, "document_id") {
                    Some(id) => vec![id],
                    None => decode(args, "document_ids")?,
                };
                ToolCall::DeleteDocument(DeleteDocRequest {
                    doc_ids,
                    delete_file: opt_bool(args, "delete_file").unwrap_or(false),
                    delete_llm_cache: opt_bool(args, "delete_llm_cache").unwrap_or(false),
                })
            }
            ToolKind::ClearDocuments => ToolCall::ClearDocuments,
            ToolKind::ReprocessFailedDocuments => ToolCall::ReprocessFailedDocuments,
            ToolKind::CancelPipeline => ToolCall::CancelPipeline,
            ToolKind::QueryText => ToolCall::QueryText(query_request(args)?),
            ToolKind::QueryTextStream => ToolCall::QueryTextStream(query_request(args)?),
            ToolKind::QueryData => ToolCall::QueryData(query_request(args)?),
            ToolKind::GetKnowledgeGraph => ToolCall::GetKnowledgeGraph {
                label: opt_str(args, "label")
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_GRAPH_LABEL.to_string()),
                max_depth: opt_u32(args, "max_depth")?,
                max_nodes: opt_u32(args, "max_nodes")?,
            },
            ToolKind::GetGraphLabels => ToolCall::GetGraphLabels,
            ToolKind::SearchGraphLabels => ToolCall::SearchGraphLabels {
                q: req_str(args, "q")?,
                limit: opt_u32(args, "limit")?.unwrap_or(DEFAULT_SEARCH_LIMIT),
            },
            ToolKind::GetPopularLabels => ToolCall::GetPopularLabels {
                limit: opt_u32(args, "limit")?.unwrap_or(DEFAULT_POPULAR_LIMIT),
            },
            ToolKind::CheckEntityExists => ToolCall::CheckEntityExists {
                entity_name: req_str(args, "entity_name")?,
            },
            ToolKind::CreateEntity => ToolCall::CreateEntity(CreateEntityRequest {
                entity_name: req_str(args, "entity_name")?,
                entity_data: req_object(args, "entity_data")?,
            }),
            ToolKind::UpdateEntity => ToolCall::UpdateEntity(EntityUpdateRequest {
                entity_name: req_str(args, "entity_name")?,
                updated_data: req_object(args, "updated_data")?,
                allow_rename: opt_bool(args, "allow_rename").unwrap_or(false),
                allow_merge: opt_bool(args, "allow_merge").unwrap_or(false),
            }),
            ToolKind::DeleteEntity => ToolCall::DeleteEntity(DeleteEntityRequest {
                entity_name: req_str(args, "entity_name")?,
            }),
            ToolKind::CreateRelation => ToolCall::CreateRelation(CreateRelationRequest {
                source_entity: req_str(args, "source_entity")?,
                target_entity: req_str(args, "target_entity")?,
                relation_data: req_object(args, "relation_data")?,
            }),
            ToolKind::UpdateRelation => ToolCall::UpdateRelation(RelationUpdateRequest {
                source_id: req_str(args, "source_id")?,
                target_id: req_str(args, "target_id")?,
                updated_data: req_object(args, "updated_data")?,
            }),
            ToolKind::DeleteRelation => ToolCall::DeleteRelation(DeleteRelationRequest {
                source_entity: req_str(args, "source_entity")?,
                target_entity: req_str(args, "target_entity")?,
            }),
            ToolKind::MergeEntities => ToolCall::MergeEntities(EntityMergeRequest {
                entities_to_change: decode(args, "entities_to_change")?,
                entity_to_change_into: req_str(args, "entity_to_change_into")?,
            }),
            ToolKind::GetPipelineStatus => ToolCall::GetPipelineStatus,
            ToolKind::GetTrackStatus => ToolCall::GetTrackStatus {
                track_id: req_str(args, "track_id")?,
            },
            ToolKind::GetDocumentStatusCounts => ToolCall::GetDocumentStatusCounts,
            ToolKind::ClearCache => ToolCall::ClearCache(ClearCacheRequest {
                cache_type: opt_str(args, "cache_type"),
            }),
            ToolKind::GetHealth => ToolCall::GetHealth,
        };

        Ok(call)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::InsertText(_) => ToolKind::InsertText,
            ToolCall::InsertTexts(_) => ToolKind::InsertTexts,
            ToolCall::UploadDocument { .. } => ToolKind::UploadDocument,
            ToolCall::ScanDocuments => ToolKind::ScanDocuments,
            ToolCall::GetDocuments => ToolKind::GetDocuments,
            ToolCall::GetDocumentsPaginated(_) => ToolKind::GetDocumentsPaginated,
            ToolCall::DeleteDocument(_) => ToolKind::DeleteDocument,
            ToolCall::ClearDocuments => ToolKind::ClearDocuments,
            ToolCall::ReprocessFailedDocuments => ToolKind::ReprocessFailedDocuments,
            ToolCall::CancelPipeline => ToolKind::CancelPipeline,
            ToolCall::QueryText(_) => ToolKind::QueryText,
            ToolCall::QueryTextStream(_) => ToolKind::QueryTextStream,
            ToolCall::QueryData(_) => ToolKind::QueryData,
            ToolCall::GetKnowledgeGraph { .. } => ToolKind::GetKnowledgeGraph,
            ToolCall::GetGraphLabels => ToolKind::GetGraphLabels,
            ToolCall::SearchGraphLabels { .. } => ToolKind::SearchGraphLabels,
            ToolCall::GetPopularLabels { .. } => ToolKind::GetPopularLabels,
            ToolCall::CheckEntityExists { .. } => ToolKind::CheckEntityExists,
            ToolCall::CreateEntity(_) => ToolKind::CreateEntity,
            ToolCall::UpdateEntity(_) => ToolKind::UpdateEntity,
            ToolCall::DeleteEntity(_) => ToolKind::DeleteEntity,
            ToolCall::CreateRelation(_) => ToolKind::CreateRelation,
            ToolCall::UpdateRelation(_) => ToolKind::UpdateRelation,
            ToolCall::DeleteRelation(_) => ToolKind::DeleteRelation,
            ToolCall::MergeEntities(_) => ToolKind::MergeEntities,
            ToolCall::GetPipelineStatus => ToolKind::GetPipelineStatus,
            ToolCall::GetTrackStatus { .. } => ToolKind::GetTrackStatus,
            ToolCall::GetDocumentStatusCounts => ToolKind::GetDocumentStatusCounts,
            ToolCall::ClearCache(_) => ToolKind::ClearCache,
            ToolCall::GetHealth => ToolKind::GetHealth,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn is_streaming(&self) -> bool {
        self.kind().is_streaming()
    }
}

// =============================================================================
// Argument Extraction
// =============================================================================

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn opt_str(args: &Arguments, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn req_str(args: &Arguments, key: &str) -> LightRagResult<String> {
    opt_str(args, key).ok_or_else(|| LightRagError::validation(format!("'{}' must be a string", key)))
}

fn opt_bool(args: &Arguments, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

fn opt_u32(args: &Arguments, key: &str) -> LightRagResult<Option<u32>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| LightRagError::validation(format!("'{}' must be a non-negative integer", key))),
    }
}

fn req_u32(args: &Arguments, key: &str) -> LightRagResult<u32> {
    opt_u32(args, key)?.ok_or_else(|| LightRagError::validation(format!("'{}' is required", key)))
}

fn req_object(args: &Arguments, key: &str) -> LightRagResult<Map<String, Value>> {
    args.get(key)
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| LightRagError::validation(format!("'{}' must be an object", key)))
}

fn decode<T: DeserializeOwned>(args: &Arguments, key: &str) -> LightRagResult<T> {
    let value = args.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| LightRagError::validation(format!("Invalid '{}': {}", key, e)))
}

fn insert_texts(args: &Arguments) -> LightRagResult<InsertTextsRequest> {
    let items = args
        .get("texts")
        .and_then(Value::as_array)
        .ok_or_else(|| LightRagError::validation("'texts' must be an array"))?;

    let mut texts = Vec::with_capacity(items.len());
    let mut file_sources = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let document = match item {
            Value::String(content) => TextDocument {
                content: content.clone(),
                title: None,
            },
            other => serde_json::from_value::<TextDocument>(other.clone())
                .map_err(|e| LightRagError::validation(format!("Invalid 'texts[{}]': {}", index, e)))?,
        };

        let source = match document.title.as_deref() {
            Some(title) if !title.trim().is_empty() => format!("{}.txt", title),
            _ => format!("text_input_{}.txt", index + 1),
        };
        texts.push(document.content);
        file_sources.push(source);
    }

    Ok(InsertTextsRequest { texts, file_sources })
}

fn query_request(args: &Arguments) -> LightRagResult<QueryRequest> {
    let mode = match opt_str(args, "mode") {
        Some(mode) => mode
            .parse::<QueryMode>()
            .map_err(|e| LightRagError::validation(format!("Invalid mode: {}", e)))?,
        None => QueryMode::default(),
    };

    let conversation_history = match args.get("conversation_history") {
        None | Some(Value::Null) => None,
        Some(_) => Some(decode::<Vec<ConversationMessage>>(args, "conversation_history")?),
    };

    Ok(QueryRequest {
        query: req_str(args, "query")?,
        mode,
        only_need_context: opt_bool(args, "only_need_context").unwrap_or(false),
        only_need_prompt: opt_bool(args, "only_need_prompt").unwrap_or(false),
        stream: None,
        top_k: opt_u32(args, "top_k")?,
        chunk_top_k: opt_u32(args, "chunk_top_k")?,
        response_type: opt_str(args, "response_type"),
        user_prompt: opt_str(args, "user_prompt"),
        include_references: opt_bool(args, "include_references"),
        enable_rerank: opt_bool(args, "enable_rerank"),
        conversation_history,
    })
}
