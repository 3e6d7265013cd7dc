//! Identity and field access shared by every record kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable unique identifier of a record.
///
/// The backend numbers stored rows; connection rows use string ids. Records
/// that arrive without any id get a generated UUID when they are decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Numeric(i64),
    Text(String),
}

impl RecordId {
    pub fn generate() -> Self {
        RecordId::Text(Uuid::new_v4().to_string())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Numeric(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// A single field of a record, as seen by filtering and sorting.
///
/// The derived ordering compares variants first (in declaration order) and
/// values second, which makes every pair of values comparable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    Missing,
    Bool(bool),
    Integer(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl FieldValue {
    /// Text used for equality predicates and substring search.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Missing => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Time(t) => Some(t.to_rfc3339()),
        }
    }

    pub fn text(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }

    /// Optional text; empty strings count as missing.
    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => FieldValue::Text(s.to_string()),
            _ => FieldValue::Missing,
        }
    }
}

impl From<&RecordId> for FieldValue {
    fn from(id: &RecordId) -> Self {
        match id {
            RecordId::Numeric(n) => FieldValue::Integer(*n),
            RecordId::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

/// Immutable telemetry item held by a live table.
pub trait Record: Clone + Send + 'static {
    /// Fields scanned by a free-text search term.
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(&self) -> &RecordId;

    fn timestamp(&self) -> DateTime<Utc>;

    /// Looks a field up by its wire name. Unknown names yield
    /// [`FieldValue::Missing`].
    fn field(&self, name: &str) -> FieldValue;
}

/// Deserializes `null` the same way as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
