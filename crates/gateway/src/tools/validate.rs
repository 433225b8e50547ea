//! Argument Validator
//!
//! Runs before any backend call. Order of checks:
//! 1. deprecated argument aliases are rewritten to their canonical names
//! 2. required keys (all missing keys are reported together)
//! 3. coarse schema checks against the tool's descriptor
//! 4. tool-specific business rules

use std::path::Path;

use serde_json::{Map, Value};

use super::registry::{descriptor, ToolKind};
use crate::lightrag::{LightRagError, LightRagResult};

/// Argument bag after validation
pub type Arguments = Map<String, Value>;

/// Required argument keys per tool
pub fn required_arguments(kind: ToolKind) -> &'static [&'static str] {
    match kind {
        ToolKind::InsertText => &["text"],
        ToolKind::InsertTexts => &["texts"],
        ToolKind::UploadDocument => &["file_path"],
        ToolKind::GetDocumentsPaginated => &["page", "page_size"],
        ToolKind::QueryText | ToolKind::QueryTextStream | ToolKind::QueryData => &["query"],
        ToolKind::SearchGraphLabels => &["q"],
        ToolKind::CheckEntityExists => &["entity_name"],
        ToolKind::CreateEntity => &["entity_name", "entity_data"],
        ToolKind::UpdateEntity => &["entity_name", "updated_data"],
        ToolKind::DeleteEntity => &["entity_name"],
        ToolKind::CreateRelation => &["source_entity", "target_entity", "relation_data"],
        ToolKind::UpdateRelation => &["source_id", "target_id", "updated_data"],
        ToolKind::DeleteRelation => &["source_entity", "target_entity"],
        ToolKind::MergeEntities => &["entities_to_change", "entity_to_change_into"],
        ToolKind::GetTrackStatus => &["track_id"],
        ToolKind::ScanDocuments
        | ToolKind::GetDocuments
        | ToolKind::DeleteDocument
        | ToolKind::ClearDocuments
        | ToolKind::ReprocessFailedDocuments
        | ToolKind::CancelPipeline
        | ToolKind::GetKnowledgeGraph
        | ToolKind::GetGraphLabels
        | ToolKind::GetPopularLabels
        | ToolKind::GetPipelineStatus
        | ToolKind::GetDocumentStatusCounts
        | ToolKind::ClearCache
        | ToolKind::GetHealth => &[],
    }
}

/// Deprecated id-based argument names and their canonical replacements
fn aliases(kind: ToolKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ToolKind::UpdateEntity => &[("entity_id", "entity_name"), ("properties", "updated_data")],
        ToolKind::DeleteEntity => &[("entity_id", "entity_name")],
        _ => &[],
    }
}

/// Validate and normalize the arguments for `kind`
pub fn validate_arguments(kind: ToolKind, mut args: Arguments) -> LightRagResult<Arguments> {
    normalize_aliases(kind, &mut args);

    if kind == ToolKind::DeleteRelation
        && args.contains_key("relation_id")
        && !(is_present(&args, "source_entity") && is_present(&args, "target_entity"))
    {
        return Err(fail(
            kind,
            "Deleting by 'relation_id' is no longer supported; provide 'source_entity' and 'target_entity'",
        ));
    }

    let missing: Vec<&str> = required_arguments(kind)
        .iter()
        .copied()
        .filter(|key| !is_present(&args, key))
        .collect();
    if !missing.is_empty() {
        return Err(fail(
            kind,
            format!("Missing required arguments for {}: {}", kind, missing.join(", ")),
        ));
    }

    check_schema(kind, &args)?;
    check_rules(kind, &args)?;

    Ok(args)
}

fn fail(kind: ToolKind, message: impl Into<String>) -> LightRagError {
    let err = LightRagError::validation(message);
    tracing::warn!(tool = %kind, reason = %err.message, "Tool arguments rejected");
    err
}

fn is_present(args: &Arguments, key: &str) -> bool {
    args.get(key).is_some_and(|v| !v.is_null())
}

fn normalize_aliases(kind: ToolKind, args: &mut Arguments) {
    for &(old, new) in aliases(kind) {
        let Some(value) = args.remove(old) else {
            continue;
        };
        if is_present(args, new) {
            tracing::warn!(tool = %kind, argument = old, "Ignoring deprecated argument; '{}' takes precedence", new);
        } else {
            tracing::warn!(tool = %kind, argument = old, "Deprecated argument; use '{}' instead", new);
            args.insert(new.to_string(), value);
        }
    }
}

// =============================================================================
// Schema Checks
// =============================================================================

fn check_schema(kind: ToolKind, args: &Arguments) -> LightRagResult<()> {
    let schema = descriptor(kind).input_schema;
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in args {
        if value.is_null() {
            continue;
        }
        // Undeclared keys are passed through untouched
        let Some(property) = properties.get(key) else {
            continue;
        };
        check_value(key, value, property).map_err(|message| fail(kind, message))?;
    }

    Ok(())
}

fn check_value(key: &str, value: &Value, property: &Value) -> Result<(), String> {
    if let Some(expected) = property.get("type") {
        if !matches_type(value, expected) {
            return Err(format!("'{}' must be of type {}", key, describe_type(expected)));
        }
    }

    if let Some(allowed) = property.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let names: Vec<String> = allowed
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect();
            return Err(format!(
                "'{}' must be one of: {} (got {})",
                key,
                names.join(", "),
                value
            ));
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = property.get("minimum").and_then(Value::as_f64) {
            if number < min {
                return Err(format!("'{}' must be >= {}", key, min));
            }
        }
        if let Some(max) = property.get("maximum").and_then(Value::as_f64) {
            if number > max {
                return Err(format!("'{}' must be <= {}", key, max));
            }
        }
    }

    if let (Some(items), Some(item_type)) = (
        value.as_array(),
        property.get("items").and_then(|i| i.get("type")),
    ) {
        for (index, item) in items.iter().enumerate() {
            if !matches_type(item, item_type) {
                return Err(format!(
                    "'{}[{}]' must be of type {}",
                    key,
                    index,
                    describe_type(item_type)
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &Value) -> bool {
    match expected {
        Value::String(name) => matches_type_name(value, name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| matches_type_name(value, name)),
        _ => true,
    }
}

fn matches_type_name(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

// =============================================================================
// Business Rules
// =============================================================================

fn check_rules(kind: ToolKind, args: &Arguments) -> LightRagResult<()> {
    // Required string arguments must carry content
    for key in required_arguments(kind) {
        if let Some(Value::String(s)) = args.get(*key) {
            if s.trim().is_empty() {
                return Err(fail(kind, format!("'{}' must not be empty", key)));
            }
        }
    }

    match kind {
        ToolKind::InsertTexts => check_texts(kind, args),
        ToolKind::UploadDocument => {
            let path = args.get("file_path").and_then(Value::as_str).unwrap_or_default();
            if !Path::new(path).is_file() {
                return Err(fail(kind, format!("File not found: {}", path)));
            }
            Ok(())
        }
        ToolKind::DeleteDocument => check_delete_document(kind, args),
        ToolKind::MergeEntities => {
            let sources = args
                .get("entities_to_change")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if sources.is_empty() {
                return Err(fail(kind, "'entities_to_change' must list at least one entity"));
            }
            if sources.iter().any(|s| s.as_str().is_some_and(|s| s.trim().is_empty())) {
                return Err(fail(kind, "'entities_to_change' must not contain empty names"));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_texts(kind: ToolKind, args: &Arguments) -> LightRagResult<()> {
    let texts = args
        .get("texts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if texts.is_empty() {
        return Err(fail(kind, "'texts' must contain at least one document"));
    }

    for (index, item) in texts.iter().enumerate() {
        let content = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("content").and_then(Value::as_str),
            _ => None,
        };
        match content {
            Some(c) if !c.trim().is_empty() => {}
            Some(_) => return Err(fail(kind, format!("'texts[{}]' has empty content", index))),
            None => {
                return Err(fail(
                    kind,
                    format!("'texts[{}]' must be a string or an object with string 'content'", index),
                ))
            }
        }
    }

    Ok(())
}

fn check_delete_document(kind: ToolKind, args: &Arguments) -> LightRagResult<()> {
    match (is_present(args, "document_id"), is_present(args, "document_ids")) {
        (true, true) => Err(fail(kind, "Provide either 'document_id' or 'document_ids', not both")),
        (false, false) => Err(fail(kind, "Provide one of 'document_id' or 'document_ids'")),
        (true, false) => {
            let id = args.get("document_id").and_then(Value::as_str).unwrap_or_default();
            if id.trim().is_empty() {
                return Err(fail(kind, "'document_id' must not be empty"));
            }
            Ok(())
        }
        (false, true) => {
            let ids = args
                .get("document_ids")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if ids.is_empty() {
                return Err(fail(kind, "'document_ids' must contain at least one ID"));
            }
            if ids.iter().any(|id| id.as_str().is_some_and(|s| s.trim().is_empty())) {
                return Err(fail(kind, "'document_ids' must not contain empty IDs"));
            }
            Ok(())
        }
    }
}
