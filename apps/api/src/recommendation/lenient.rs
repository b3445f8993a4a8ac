//! Forgiving field deserializers for model-written course records.
//!
//! The model drifts on types (`null` descriptions, `"prioritaire"`, a bare
//! string for a list, `8.5` for an integer). A course is only worth dropping
//! when it isn't an object at all, so every field here accepts any JSON value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::recommendation::Priority;

const IMPORTANCE_MIN: f64 = 1.0;
const IMPORTANCE_MAX: f64 = 10.0;

/// Scalar as text; `null`, arrays and objects become `""`.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(value).unwrap_or_default())
}

pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// A list of ids. A single string is split on commas.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    };
    Ok(list)
}

/// Case-insensitive; anything unrecognized is `Utile`.
pub fn priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let priority = match value.as_str().map(|s| s.trim().to_lowercase()).as_deref() {
        Some("prioritaire") => Priority::Prioritaire,
        Some("important") => Priority::Important,
        _ => Priority::Utile,
    };
    Ok(priority)
}

/// Number or numeric string, rounded and clamped to 1–10. Anything else is `None`.
pub fn importance<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(raw
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(IMPORTANCE_MIN, IMPORTANCE_MAX) as u8))
}
