//! Tool Registry
//!
//! Static catalogue of every tool the gateway exposes. `ToolKind` is the
//! single list of supported tools: descriptors are generated from it, and the
//! typed call parser matches on it, so listing and dispatch cannot drift.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lightrag_mcp_shared::types::{DocStatus, QueryMode};

/// Every supported tool, by unprefixed name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    // Documents
    InsertText,
    InsertTexts,
    UploadDocument,
    ScanDocuments,
    GetDocuments,
    GetDocumentsPaginated,
    DeleteDocument,
    ClearDocuments,
    ReprocessFailedDocuments,
    CancelPipeline,
    // Query
    QueryText,
    QueryTextStream,
    QueryData,
    // Knowledge graph
    GetKnowledgeGraph,
    GetGraphLabels,
    SearchGraphLabels,
    GetPopularLabels,
    CheckEntityExists,
    CreateEntity,
    UpdateEntity,
    DeleteEntity,
    CreateRelation,
    UpdateRelation,
    DeleteRelation,
    MergeEntities,
    // System
    GetPipelineStatus,
    GetTrackStatus,
    GetDocumentStatusCounts,
    ClearCache,
    GetHealth,
}

impl ToolKind {
    pub const ALL: [ToolKind; 30] = [
        ToolKind::InsertText,
        ToolKind::InsertTexts,
        ToolKind::UploadDocument,
        ToolKind::ScanDocuments,
        ToolKind::GetDocuments,
        ToolKind::GetDocumentsPaginated,
        ToolKind::DeleteDocument,
        ToolKind::ClearDocuments,
        ToolKind::ReprocessFailedDocuments,
        ToolKind::CancelPipeline,
        ToolKind::QueryText,
        ToolKind::QueryTextStream,
        ToolKind::QueryData,
        ToolKind::GetKnowledgeGraph,
        ToolKind::GetGraphLabels,
        ToolKind::SearchGraphLabels,
        ToolKind::GetPopularLabels,
        ToolKind::CheckEntityExists,
        ToolKind::CreateEntity,
        ToolKind::UpdateEntity,
        ToolKind::DeleteEntity,
        ToolKind::CreateRelation,
        ToolKind::UpdateRelation,
        ToolKind::DeleteRelation,
        ToolKind::MergeEntities,
        ToolKind::GetPipelineStatus,
        ToolKind::GetTrackStatus,
        ToolKind::GetDocumentStatusCounts,
        ToolKind::ClearCache,
        ToolKind::GetHealth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::InsertText => "insert_text",
            ToolKind::InsertTexts => "insert_texts",
            ToolKind::UploadDocument => "upload_document",
            ToolKind::ScanDocuments => "scan_documents",
            ToolKind::GetDocuments => "get_documents",
            ToolKind::GetDocumentsPaginated => "get_documents_paginated",
            ToolKind::DeleteDocument => "delete_document",
            ToolKind::ClearDocuments => "clear_documents",
            ToolKind::ReprocessFailedDocuments => "reprocess_failed_documents",
            ToolKind::CancelPipeline => "cancel_pipeline",
            ToolKind::QueryText => "query_text",
            ToolKind::QueryTextStream => "query_text_stream",
            ToolKind::QueryData => "query_data",
            ToolKind::GetKnowledgeGraph => "get_knowledge_graph",
            ToolKind::GetGraphLabels => "get_graph_labels",
            ToolKind::SearchGraphLabels => "search_graph_labels",
            ToolKind::GetPopularLabels => "get_popular_labels",
            ToolKind::CheckEntityExists => "check_entity_exists",
            ToolKind::CreateEntity => "create_entity",
            ToolKind::UpdateEntity => "update_entity",
            ToolKind::DeleteEntity => "delete_entity",
            ToolKind::CreateRelation => "create_relation",
            ToolKind::UpdateRelation => "update_relation",
            ToolKind::DeleteRelation => "delete_relation",
            ToolKind::MergeEntities => "merge_entities",
            ToolKind::GetPipelineStatus => "get_pipeline_status",
            ToolKind::GetTrackStatus => "get_track_status",
            ToolKind::GetDocumentStatusCounts => "get_document_status_counts",
            ToolKind::ClearCache => "clear_cache",
            ToolKind::GetHealth => "get_health",
        }
    }

    /// Look up an unprefixed tool name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Tools whose result is an incremental text stream
    pub fn is_streaming(self) -> bool {
        matches!(self, ToolKind::QueryTextStream)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool as presented to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Malformed catalogue entry, detected before serving any listing
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Tool '{0}' has an empty description")]
    EmptyDescription(String),
    #[error("Tool '{tool}' has an invalid schema: {reason}")]
    InvalidSchema { tool: String, reason: String },
    #[error("Tool '{0}' is listed more than once")]
    Duplicate(String),
}

/// Build the canonical, unprefixed catalogue
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    ToolKind::ALL.into_iter().map(descriptor).collect()
}

/// Descriptor for a single tool
pub fn descriptor(kind: ToolKind) -> ToolDescriptor {
    ToolDescriptor {
        name: kind.as_str().to_string(),
        description: description(kind).to_string(),
        input_schema: input_schema(kind),
    }
}

fn description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::InsertText => "Insert text content into LightRAG",
        ToolKind::InsertTexts => "Insert multiple text documents into LightRAG",
        ToolKind::UploadDocument => "Upload a document file to LightRAG",
        ToolKind::ScanDocuments => "Scan the input directory for new documents",
        ToolKind::GetDocuments => "Retrieve all documents grouped by processing status",
        ToolKind::GetDocumentsPaginated => {
            "Retrieve documents with pagination. page is 1-based; page_size must be between 1 and 100"
        }
        ToolKind::DeleteDocument => {
            "Delete documents by ID. Use either 'document_id' for a single document or 'document_ids' for a batch, not both"
        }
        ToolKind::ClearDocuments => "Clear all documents from LightRAG",
        ToolKind::ReprocessFailedDocuments => "Reprocess documents that previously failed ingestion",
        ToolKind::CancelPipeline => "Cancel the running ingestion pipeline",
        ToolKind::QueryText => "Query LightRAG with text",
        ToolKind::QueryTextStream => "Stream query results from LightRAG",
        ToolKind::QueryData => "Retrieve structured context (entities, relationships, chunks) for a query without generation",
        ToolKind::GetKnowledgeGraph => "Retrieve a knowledge graph subgraph around a label",
        ToolKind::GetGraphLabels => "List all labels in the knowledge graph",
        ToolKind::SearchGraphLabels => "Search knowledge graph labels by substring",
        ToolKind::GetPopularLabels => "List the most connected labels in the knowledge graph",
        ToolKind::CheckEntityExists => "Check if an entity exists in the knowledge graph",
        ToolKind::CreateEntity => "Create an entity in the knowledge graph",
        ToolKind::UpdateEntity => "Update an entity in the knowledge graph",
        ToolKind::DeleteEntity => "Delete an entity from the knowledge graph",
        ToolKind::CreateRelation => "Create a relation between two entities",
        ToolKind::UpdateRelation => "Update a relation in the knowledge graph",
        ToolKind::DeleteRelation => "Delete the relation between two entities",
        ToolKind::MergeEntities => "Merge several entities into one target entity",
        ToolKind::GetPipelineStatus => "Get the ingestion pipeline status",
        ToolKind::GetTrackStatus => "Get the processing status of documents by track ID",
        ToolKind::GetDocumentStatusCounts => "Get document counts per processing status",
        ToolKind::ClearCache => "Clear the LightRAG LLM response cache",
        ToolKind::GetHealth => "Check LightRAG server health",
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn query_schema() -> Value {
    object_schema(
        json!({
            "query": {"type": "string", "description": "Query text"},
            "mode": {
                "type": "string",
                "description": "Retrieval mode",
                "enum": QueryMode::names(),
                "default": QueryMode::default().as_str()
            },
            "only_need_context": {
                "type": "boolean",
                "description": "Return the retrieved context without generating an answer",
                "default": false
            },
            "only_need_prompt": {
                "type": "boolean",
                "description": "Return the generated prompt without calling the LLM",
                "default": false
            },
            "top_k": {"type": "integer", "minimum": 1, "description": "Number of entities or relations to retrieve"},
            "chunk_top_k": {"type": "integer", "minimum": 1, "description": "Number of text chunks to retrieve"},
            "response_type": {"type": "string", "description": "Answer format, e.g. 'Multiple Paragraphs'"},
            "user_prompt": {"type": "string", "description": "Extra instructions appended to the LLM prompt"},
            "include_references": {"type": "boolean", "description": "Include source references in the answer"},
            "enable_rerank": {"type": "boolean", "description": "Rerank retrieved chunks"},
            "conversation_history": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "role": {"type": "string"},
                        "content": {"type": "string"}
                    },
                    "required": ["role", "content"]
                },
                "description": "Prior conversation turns"
            }
        }),
        &["query"],
    )
}

fn empty_schema() -> Value {
    object_schema(json!({}), &[])
}

fn input_schema(kind: ToolKind) -> Value {
    match kind {
        ToolKind::InsertText => object_schema(
            json!({
                "text": {"type": "string", "description": "Text content to insert"},
                "title": {"type": "string", "description": "Optional title, used as the source file name"}
            }),
            &["text"],
        ),
        ToolKind::InsertTexts => object_schema(
            json!({
                "texts": {
                    "type": "array",
                    "items": {
                        "type": ["string", "object"],
                        "properties": {
                            "title": {"type": "string"},
                            "content": {"type": "string"},
                            "metadata": {"type": "object"}
                        },
                        "required": ["content"]
                    },
                    "description": "Documents to insert: plain strings or objects with 'content' and optional 'title'"
                }
            }),
            &["texts"],
        ),
        ToolKind::UploadDocument => object_schema(
            json!({
                "file_path": {"type": "string", "description": "Path to the file to upload"}
            }),
            &["file_path"],
        ),
        ToolKind::GetDocumentsPaginated => object_schema(
            json!({
                "page": {"type": "integer", "minimum": 1, "description": "Page number (1-based)"},
                "page_size": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 100,
                    "description": "Number of documents per page"
                },
                "status_filter": {
                    "type": "string",
                    "enum": DocStatus::names(),
                    "description": "Only return documents in this status"
                }
            }),
            &["page", "page_size"],
        ),
        ToolKind::DeleteDocument => object_schema(
            json!({
                "document_id": {"type": "string", "description": "Single document ID to delete"},
                "document_ids": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Document IDs to delete in one batch"
                },
                "delete_file": {
                    "type": "boolean",
                    "default": false,
                    "description": "Also delete the uploaded source file"
                },
                "delete_llm_cache": {
                    "type": "boolean",
                    "default": false,
                    "description": "Also delete cached LLM extraction results"
                }
            }),
            &[],
        ),
        ToolKind::QueryText | ToolKind::QueryTextStream | ToolKind::QueryData => query_schema(),
        ToolKind::GetKnowledgeGraph => object_schema(
            json!({
                "label": {"type": "string", "default": "*", "description": "Starting label, '*' for the whole graph"},
                "max_depth": {"type": "integer", "minimum": 1, "description": "Maximum traversal depth"},
                "max_nodes": {"type": "integer", "minimum": 1, "description": "Maximum number of nodes returned"}
            }),
            &[],
        ),
        ToolKind::SearchGraphLabels => object_schema(
            json!({
                "q": {"type": "string", "description": "Search text"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 50}
            }),
            &["q"],
        ),
        ToolKind::GetPopularLabels => object_schema(
            json!({
                "limit": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 300}
            }),
            &[],
        ),
        ToolKind::CheckEntityExists => object_schema(
            json!({
                "entity_name": {"type": "string", "description": "Name of the entity to check"}
            }),
            &["entity_name"],
        ),
        ToolKind::CreateEntity => object_schema(
            json!({
                "entity_name": {"type": "string", "description": "Name of the new entity"},
                "entity_data": {"type": "object", "description": "Entity properties, e.g. description and entity_type"}
            }),
            &["entity_name", "entity_data"],
        ),
        ToolKind::UpdateEntity => object_schema(
            json!({
                "entity_name": {"type": "string", "description": "Name of the entity to update"},
                "updated_data": {"type": "object", "description": "Properties to update"},
                "allow_rename": {"type": "boolean", "default": false},
                "allow_merge": {"type": "boolean", "default": false},
                "entity_id": {"type": "string", "description": "Deprecated alias of entity_name"},
                "properties": {"type": "object", "description": "Deprecated alias of updated_data"}
            }),
            &["entity_name", "updated_data"],
        ),
        ToolKind::DeleteEntity => object_schema(
            json!({
                "entity_name": {"type": "string", "description": "Name of the entity to delete"},
                "entity_id": {"type": "string", "description": "Deprecated alias of entity_name"}
            }),
            &["entity_name"],
        ),
        ToolKind::CreateRelation => object_schema(
            json!({
                "source_entity": {"type": "string"},
                "target_entity": {"type": "string"},
                "relation_data": {"type": "object", "description": "Relation properties, e.g. description and keywords"}
            }),
            &["source_entity", "target_entity", "relation_data"],
        ),
        ToolKind::UpdateRelation => object_schema(
            json!({
                "source_id": {"type": "string", "description": "Name of the source entity"},
                "target_id": {"type": "string", "description": "Name of the target entity"},
                "updated_data": {"type": "object", "description": "Properties to update on the relation"}
            }),
            &["source_id", "target_id", "updated_data"],
        ),
        ToolKind::DeleteRelation => object_schema(
            json!({
                "source_entity": {"type": "string"},
                "target_entity": {"type": "string"}
            }),
            &["source_entity", "target_entity"],
        ),
        ToolKind::MergeEntities => object_schema(
            json!({
                "entities_to_change": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Entities to merge away"
                },
                "entity_to_change_into": {"type": "string", "description": "Entity that receives the merge"}
            }),
            &["entities_to_change", "entity_to_change_into"],
        ),
        ToolKind::GetTrackStatus => object_schema(
            json!({
                "track_id": {"type": "string", "description": "Track ID returned by an insert or upload"}
            }),
            &["track_id"],
        ),
        ToolKind::ClearCache => object_schema(
            json!({
                "cache_type": {"type": "string", "description": "Cache segment to clear; all when omitted"}
            }),
            &[],
        ),
        ToolKind::ScanDocuments
        | ToolKind::GetDocuments
        | ToolKind::ClearDocuments
        | ToolKind::ReprocessFailedDocuments
        | ToolKind::CancelPipeline
        | ToolKind::GetGraphLabels
        | ToolKind::GetPipelineStatus
        | ToolKind::GetDocumentStatusCounts
        | ToolKind::GetHealth => empty_schema(),
    }
}

/// Check that every descriptor is servable: non-empty name and description,
/// an object schema whose `required` keys are all declared properties.
pub fn validate_descriptors(descriptors: &[ToolDescriptor]) -> Result<(), RegistryError> {
    let mut seen = std::collections::HashSet::new();

    for (index, tool) in descriptors.iter().enumerate() {
        if tool.name.trim().is_empty() {
            return Err(RegistryError::EmptyName(index));
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(RegistryError::Duplicate(tool.name.clone()));
        }
        if tool.description.trim().is_empty() {
            return Err(RegistryError::EmptyDescription(tool.name.clone()));
        }

        let invalid = |reason: &str| RegistryError::InvalidSchema {
            tool: tool.name.clone(),
            reason: reason.to_string(),
        };

        let schema = tool
            .input_schema
            .as_object()
            .ok_or_else(|| invalid("schema is not an object"))?;
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(invalid("schema type must be 'object'"));
        }
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| invalid("'properties' must be an object"))?;

        if let Some(required) = schema.get("required") {
            let required = required
                .as_array()
                .ok_or_else(|| invalid("'required' must be an array"))?;
            for key in required {
                let key = key
                    .as_str()
                    .ok_or_else(|| invalid("'required' entries must be strings"))?;
                if !properties.contains_key(key) {
                    return Err(invalid(&format!("required key '{}' is not a declared property", key)));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_valid() {
        let tools = tool_descriptors();
        assert_eq!(tools.len(), 30);
        validate_descriptors(&tools).unwrap();
    }

    #[test]
    fn test_names_round_trip_through_kind() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("drop_database"), None);
    }

    #[test]
    fn test_only_stream_tool_is_streaming() {
        let streaming: Vec<_> = ToolKind::ALL.into_iter().filter(|k| k.is_streaming()).collect();
        assert_eq!(streaming, vec![ToolKind::QueryTextStream]);
    }

    #[test]
    fn test_query_schema_lists_all_modes() {
        let schema = descriptor(ToolKind::QueryText).input_schema;
        let modes = schema["properties"]["mode"]["enum"].as_array().unwrap();
        assert_eq!(modes.len(), 6);
        assert_eq!(schema["properties"]["mode"]["default"], "mix");
    }

    #[test]
    fn test_rejects_empty_description() {
        let mut tools = tool_descriptors();
        tools[3].description = "  ".to_string();
        assert!(matches!(
            validate_descriptors(&tools),
            Err(RegistryError::EmptyDescription(name)) if name == "scan_documents"
        ));
    }

    #[test]
    fn test_rejects_undeclared_required_key() {
        let tools = vec![ToolDescriptor {
            name: "broken".to_string(),
            description: "Broken tool".to_string(),
            input_schema: json!({"type": "object", "properties": {}, "required": ["ghost"]}),
        }];
        assert!(matches!(
            validate_descriptors(&tools),
            Err(RegistryError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_empty_names() {
        let mut tools = vec![descriptor(ToolKind::GetHealth), descriptor(ToolKind::GetHealth)];
        assert!(matches!(validate_descriptors(&tools), Err(RegistryError::Duplicate(_))));

        tools[1].name = String::new();
        assert!(matches!(validate_descriptors(&tools), Err(RegistryError::EmptyName(1))));
    }
}
