//! Accessors for resource payloads returned by the platform API.
//!
//! Listings come back as loosely-typed JSON objects whose shape varies between
//! platform versions, so these helpers read fields defensively instead of
//! deserializing into fixed structs.

use crate::ResourceKind;

use serde_json::Value;

/// Server-local integer id, if present.
pub fn resource_id(resource: &Value) -> Option<i64> {
    resource.get("id").and_then(Value::as_i64)
}

/// Stable uuid, if the listing exposes one.
pub fn resource_uuid(resource: &Value) -> Option<String> {
    match resource.get("uuid")? {
        Value::String(uuid) if !uuid.is_empty() => Some(uuid.clone()),
        _ => None,
    }
}

/// First non-empty name field for the kind.
pub fn display_name(kind: ResourceKind, resource: &Value) -> Option<String> {
    kind.name_keys()
        .iter()
        .filter_map(|key| resource.get(*key))
        .find_map(|value| match value {
            Value::String(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        })
}

/// Database id referenced by a dataset: `database_id`, else nested `database.id`.
pub fn dataset_database_id(dataset: &Value) -> Option<i64> {
    if let Some(database_id) = dataset.get("database_id") {
        return database_id.as_i64();
    }
    dataset
        .get("database")
        .filter(|database| database.is_object())
        .and_then(|database| database.get("id"))
        .and_then(Value::as_i64)
}

/// Render a scalar field the way filters compare it.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}
