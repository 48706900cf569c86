//! Schemaless entity records
//!
//! A [`Record`] is one row of an entity, held as a JSON object. Stores return
//! records, `save` builds them, and [`Page`](crate::page::Page) carries them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One row of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Set a field and return the record
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Whether the field is absent or null
    pub fn is_unset(&self, field: &str) -> bool {
        self.get(field).map_or(true, Value::is_null)
    }

    /// Iterate over fields
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The identifying value under the given primary key, when set
    pub fn id(&self, primary_key: &str) -> Option<&Value> {
        self.get(primary_key).filter(|v| !v.is_null())
    }

    /// Consume into the underlying JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::validation(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut record = Record::new().with("name", "alice");
        assert_eq!(record.get("name"), Some(&json!("alice")));
        assert_eq!(record.set("name", "bob"), Some(json!("alice")));
        assert_eq!(record.remove("name"), Some(json!("bob")));
        assert!(record.is_unset("name"));
    }

    #[test]
    fn test_null_counts_as_unset() {
        let record = Record::new().with("deleted_at", Value::Null).with("id", 1);
        assert!(record.is_unset("deleted_at"));
        assert!(record.is_unset("missing"));
        assert!(!record.is_unset("id"));
        assert_eq!(record.id("id"), Some(&json!(1)));
        assert_eq!(Record::new().with("id", Value::Null).id("id"), None);
    }

    #[test]
    fn test_try_from_value() {
        let record = Record::try_from(json!({"name": "x"})).unwrap();
        assert_eq!(record.get("name"), Some(&json!("x")));

        let err = Record::try_from(json!("not-a-map")).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let record = Record::new().with("id", 7);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": 7}));
    }
}
