//! Dynamic table row

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A single table row.
///
/// Rows are opaque to the engine: they are identified only by their absolute
/// index in the current ordering and carry arbitrary named fields. Field
/// values are JSON values so any data source can hand them over unchanged.
///
/// # Example
///
/// ```
/// use vgrid_lib::model::Row;
///
/// let row = Row::new()
///     .set("name", "Contoso")
///     .set("revenue", 1_000_000);
///
/// assert_eq!(row.get_str("name"), Some("Contoso"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    /// Creates a row with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from a JSON value.
    ///
    /// Returns `None` unless the value is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Sets a field, returning the row (builder style).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a field in place, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field as a string slice, if it is a JSON string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns the field as an `i64`, if it is an integral JSON number.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Returns `true` if the field exists and is not `null`.
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|value| !value.is_null())
    }

    /// Returns the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_and_getters() {
        let row = Row::new().set("id", 7).set("name", "Brand").set("note", Value::Null);

        assert_eq!(row.get_i64("id"), Some(7));
        assert_eq!(row.get_str("name"), Some("Brand"));
        assert!(row.has("name"));
        assert!(!row.has("note"));
        assert!(!row.has("missing"));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_from_value() {
        let row = Row::from_value(json!({ "id": "a1", "score": 3.5 })).unwrap();
        assert_eq!(row.get_str("id"), Some("a1"));
        assert!(Row::from_value(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_serde_is_transparent() {
        let row: Row = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(row.get_str("name"), Some("x"));
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"name":"x"}"#);
    }
}
