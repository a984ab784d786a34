use crate::resource::value_text;
use crate::{CoreError, CoreResult, ResourceKind};

use std::collections::BTreeSet;

use serde_json::Value;

/// Keys matched with a case-insensitive substring rather than equality.
pub const CONTAINS_FILTER_KEYS: &[&str] = &["dashboard_title"];

/// Keys the list endpoint cannot filter on; always evaluated client-side.
pub const LOCAL_FILTER_KEYS: &[&str] = &["certified_by", "is_managed_externally"];

/// User-facing aliases for canonical API keys.
pub const FILTER_ALIASES: &[(&str, &str)] = &[("managed_externally", "is_managed_externally")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKeyType {
    Integer,
    Text,
    Boolean,
}

const DASHBOARD_FILTER_KEYS: &[(&str, FilterKeyType)] = &[
    ("id", FilterKeyType::Integer),
    ("slug", FilterKeyType::Text),
    ("dashboard_title", FilterKeyType::Text),
    ("certified_by", FilterKeyType::Text),
    ("is_managed_externally", FilterKeyType::Boolean),
];

const ID_FILTER_KEYS: &[(&str, FilterKeyType)] = &[("id", FilterKeyType::Integer)];

/// Filter keys accepted for a resource kind.
pub fn filter_keys(kind: ResourceKind) -> &'static [(&'static str, FilterKeyType)] {
    match kind {
        ResourceKind::Dashboard => DASHBOARD_FILTER_KEYS,
        ResourceKind::Chart | ResourceKind::Dataset | ResourceKind::Database => ID_FILTER_KEYS,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl FilterValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(number) => Value::from(*number),
            Self::Boolean(flag) => Value::Bool(*flag),
        }
    }

    fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Self::Boolean(expected) => actual.and_then(normalize_bool) == Some(*expected),
            Self::Integer(expected) => value_text(actual).trim().parse::<i64>().ok() == Some(*expected),
            Self::Text(expected) if expected.is_empty() => value_text(actual).is_empty(),
            Self::Text(expected) => actual.is_some() && value_text(actual) == *expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(FilterValue),
    Contains(String),
    In(Vec<FilterValue>),
}

impl Predicate {
    /// Operator code understood by the list endpoint.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Equal(_) => "eq",
            Self::Contains(_) => "ct",
            Self::In(_) => "in",
        }
    }

    pub fn value_json(&self) -> Value {
        match self {
            Self::Equal(value) => value.to_json(),
            Self::Contains(text) => Value::String(text.clone()),
            Self::In(values) => Value::Array(values.iter().map(FilterValue::to_json).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub key: String,
    pub predicate: Predicate,
}

impl Filter {
    pub fn equal(key: &str, value: FilterValue) -> Self {
        Self {
            key: key.to_string(),
            predicate: Predicate::Equal(value),
        }
    }

    pub fn contains(key: &str, text: &str) -> Self {
        Self {
            key: key.to_string(),
            predicate: Predicate::Contains(text.to_string()),
        }
    }

    pub fn one_of(key: &str, values: Vec<FilterValue>) -> Self {
        Self {
            key: key.to_string(),
            predicate: Predicate::In(values),
        }
    }

    pub fn is_local_only(&self) -> bool {
        LOCAL_FILTER_KEYS.contains(&self.key.as_str())
    }

    /// Evaluate the filter against one resource payload.
    pub fn matches(&self, resource: &Value) -> bool {
        let actual = resource.get(&self.key);
        match &self.predicate {
            Predicate::Contains(expected) => value_text(actual)
                .to_lowercase()
                .contains(&expected.to_lowercase()),
            Predicate::Equal(expected) => expected.matches(actual),
            Predicate::In(values) => values.iter().any(|value| value.matches(actual)),
        }
    }
}

/// Interpret a JSON value as a boolean the way the platform serializes flags.
pub fn normalize_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => parse_bool(text),
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Parse "true"/"false", ignoring case and surrounding whitespace.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn coerce_value(key: &str, raw: &str, key_type: FilterKeyType) -> CoreResult<FilterValue> {
    match key_type {
        FilterKeyType::Text => Ok(FilterValue::Text(raw.to_string())),
        FilterKeyType::Integer => raw.parse::<i64>().map(FilterValue::Integer).map_err(|_| {
            CoreError::invalid_filter(format!("Invalid value for {key}. Expected int."))
        }),
        FilterKeyType::Boolean => parse_bool(raw).map(FilterValue::Boolean).ok_or_else(|| {
            CoreError::invalid_filter(format!("Invalid value for {key}. Expected true or false."))
        }),
    }
}

/// Parse repeatable `key=value` arguments into filters for `kind`.
pub fn parse_filters(raw_filters: &[String], kind: ResourceKind) -> CoreResult<Vec<Filter>> {
    let allowed = filter_keys(kind);
    let mut seen = BTreeSet::new();
    let mut filters = Vec::with_capacity(raw_filters.len());

    for item in raw_filters {
        let Some((key, value)) = item.split_once('=') else {
            return Err(CoreError::invalid_filter(format!(
                "Invalid filter '{item}'. Expected key=value."
            )));
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(CoreError::invalid_filter(format!(
                "Invalid filter '{item}'. Filter key cannot be empty."
            )));
        }

        let key = FILTER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(key, |(_, canonical)| *canonical);

        let Some((_, key_type)) = allowed.iter().find(|(name, _)| *name == key) else {
            let names: BTreeSet<&str> = allowed.iter().map(|(name, _)| *name).collect();
            return Err(CoreError::invalid_filter(format!(
                "Invalid filter key '{key}'. Allowed keys: {}.",
                names.into_iter().collect::<Vec<_>>().join(", ")
            )));
        };
        if !seen.insert(key.to_string()) {
            return Err(CoreError::invalid_filter(format!(
                "Duplicate filter key '{key}'. Pass each filter key at most once."
            )));
        }

        let filter = match coerce_value(key, value, *key_type)? {
            FilterValue::Text(text) if CONTAINS_FILTER_KEYS.contains(&key) => {
                Filter::contains(key, &text)
            }
            coerced => Filter::equal(key, coerced),
        };
        filters.push(filter);
    }

    if filters.is_empty() {
        return Err(CoreError::invalid_filter(
            "At least one filter is required.",
        ));
    }

    Ok(filters)
}

/// Keep only the resources matching every filter.
pub fn filter_locally(resources: Vec<Value>, filters: &[Filter]) -> Vec<Value> {
    resources
        .into_iter()
        .filter(|resource| filters.iter().all(|filter| filter.matches(resource)))
        .collect()
}
