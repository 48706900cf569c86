//! Entity descriptors
//!
//! An [`EntityDescriptor`] is the static description of an entity's queryable
//! surface: its name, primary key, declared fields and their kinds, and the
//! optional soft-delete field. It is built once at registration and shared
//! read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::schema::{EntityDescriptor, FieldKind, TemporalKind};
//!
//! let users = EntityDescriptor::builder("users")
//!     .field("name", FieldKind::String)
//!     .field("deleted_at", FieldKind::UtcDateTime)
//!     .soft_delete("deleted_at")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(users.primary_key(), "id");
//! assert!(users.soft_delete().is_some());
//! assert_eq!(FieldKind::UtcDateTime.temporal(), Some(TemporalKind::Utc));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// Declared kind of an entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text
    String,
    /// 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// Date and time without a zone
    NaiveDateTime,
    /// Date and time in UTC
    UtcDateTime,
    /// Anything else (JSON documents, arrays, custom types)
    Other,
}

/// The two timestamp representations a soft-delete field may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Date and time without a zone
    Naive,
    /// Date and time in UTC
    Utc,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::NaiveDateTime => write!(f, "naive_date_time"),
            Self::UtcDateTime => write!(f, "utc_date_time"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FieldKind {
    /// The temporal kind, if this field holds a timestamp
    #[must_use]
    pub const fn temporal(self) -> Option<TemporalKind> {
        match self {
            Self::NaiveDateTime => Some(TemporalKind::Naive),
            Self::UtcDateTime => Some(TemporalKind::Utc),
            _ => None,
        }
    }

    /// Cast an incoming JSON value to this kind
    ///
    /// Text is accepted for numbers, booleans and timestamps when it parses.
    /// Returns `None` when the value cannot represent this kind. `null` is
    /// always accepted.
    pub fn cast(self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match (self, value) {
            (Self::Other, v) => Some(v.clone()),
            (Self::String, Value::String(_)) => Some(value.clone()),
            (Self::Integer, Value::Number(n)) if n.is_i64() => Some(value.clone()),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::Float, Value::Number(_)) => Some(value.clone()),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (Self::Boolean, Value::Bool(_)) => Some(value.clone()),
            (Self::Boolean, Value::String(s)) => s.trim().parse::<bool>().ok().map(Value::Bool),
            (Self::NaiveDateTime, Value::String(s)) => parse_naive(s).map(|_| value.clone()),
            (Self::UtcDateTime, Value::String(s)) => parse_utc(s).map(|_| value.clone()),
            _ => None,
        }
    }
}

/// Parse a timestamp without zone; a bare date means midnight
pub(crate) fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a UTC timestamp; zone-less input is read as UTC
pub(crate) fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(raw).map(|dt| dt.and_utc())
}

/// The soft-delete field of an entity, with its kind resolved at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDeleteField {
    name: String,
    kind: FieldKind,
}

impl SoftDeleteField {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field kind
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The timestamp representation to write on delete
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the field was not declared with
    /// one of the two supported temporal kinds.
    pub fn temporal_kind(&self) -> Result<TemporalKind> {
        self.kind.temporal().ok_or_else(|| {
            Error::configuration(format!(
                "soft-delete field `{}` has kind `{}`, expected naive_date_time or utc_date_time",
                self.name, self.kind
            ))
        })
    }
}

/// Static description of an entity's queryable surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    primary_key: String,
    fields: BTreeMap<String, FieldKind>,
    soft_delete: Option<SoftDeleteField>,
}

impl EntityDescriptor {
    /// Start building a descriptor for the named entity (table)
    pub fn builder(name: impl Into<String>) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder {
            name: name.into(),
            primary_key: "id".to_string(),
            fields: BTreeMap::new(),
            soft_delete: None,
        }
    }

    /// Entity name, used as the query source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the identifying field
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Kind of the primary key
    pub fn primary_key_kind(&self) -> FieldKind {
        self.field_kind(&self.primary_key)
            .unwrap_or(FieldKind::Integer)
    }

    /// Declared kind of a field, `None` when the field is unknown
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    /// Whether the field is declared
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate over declared fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// The soft-delete field, when soft delete is configured
    pub fn soft_delete(&self) -> Option<&SoftDeleteField> {
        self.soft_delete.as_ref()
    }

    /// Return a copy with soft delete configured on the given field
    ///
    /// The field kind is looked up once here. An undeclared field resolves to
    /// [`FieldKind::Other`], which fails later at delete time.
    #[must_use]
    pub fn with_soft_delete(mut self, field: impl Into<String>) -> Self {
        let name = field.into();
        let kind = self.field_kind(&name).unwrap_or(FieldKind::Other);
        self.soft_delete = Some(SoftDeleteField { name, kind });
        self
    }
}

/// Builder for [`EntityDescriptor`]
#[derive(Debug, Clone)]
pub struct EntityDescriptorBuilder {
    name: String,
    primary_key: String,
    fields: BTreeMap<String, FieldKind>,
    soft_delete: Option<String>,
}

impl EntityDescriptorBuilder {
    /// Override the identifying field (default `id`)
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Declare a field and its kind
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Enable soft delete through the named field
    #[must_use]
    pub fn soft_delete(mut self, field: impl Into<String>) -> Self {
        self.soft_delete = Some(field.into());
        self
    }

    /// Finish the descriptor
    ///
    /// An undeclared primary key is added as an integer field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the entity or primary key name is empty.
    pub fn build(mut self) -> Result<EntityDescriptor> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("entity name must not be empty"));
        }
        if self.primary_key.trim().is_empty() {
            return Err(Error::configuration(format!(
                "entity `{}` has an empty primary key name",
                self.name
            )));
        }
        self.fields
            .entry(self.primary_key.clone())
            .or_insert(FieldKind::Integer);

        let descriptor = EntityDescriptor {
            name: self.name,
            primary_key: self.primary_key,
            fields: self.fields,
            soft_delete: None,
        };
        Ok(match self.soft_delete {
            Some(field) => descriptor.with_soft_delete(field),
            None => descriptor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> EntityDescriptor {
        EntityDescriptor::builder("users")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Integer)
            .field("deleted_at", FieldKind::NaiveDateTime)
            .soft_delete("deleted_at")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_adds_primary_key() {
        let descriptor = users();
        assert_eq!(descriptor.primary_key(), "id");
        assert_eq!(descriptor.field_kind("id"), Some(FieldKind::Integer));
        assert_eq!(descriptor.fields().count(), 4);
    }

    #[test]
    fn test_custom_primary_key_keeps_declared_kind() {
        let descriptor = EntityDescriptor::builder("posts")
            .primary_key("slug")
            .field("slug", FieldKind::String)
            .build()
            .unwrap();
        assert_eq!(descriptor.primary_key(), "slug");
        assert_eq!(descriptor.primary_key_kind(), FieldKind::String);
    }

    #[test]
    fn test_empty_name_is_configuration_error() {
        let err = EntityDescriptor::builder("  ").build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_soft_delete_kind_resolved_at_build() {
        let descriptor = users();
        let field = descriptor.soft_delete().unwrap();
        assert_eq!(field.name(), "deleted_at");
        assert_eq!(field.temporal_kind().unwrap(), TemporalKind::Naive);
    }

    #[test]
    fn test_non_temporal_soft_delete_builds_but_fails_to_resolve() {
        let descriptor = EntityDescriptor::builder("users")
            .field("deleted", FieldKind::Boolean)
            .soft_delete("deleted")
            .build()
            .unwrap();
        let err = descriptor.soft_delete().unwrap().temporal_kind().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("deleted"));
    }

    #[test]
    fn test_undeclared_soft_delete_field_resolves_to_other() {
        let descriptor = EntityDescriptor::builder("users")
            .soft_delete("removed_at")
            .build()
            .unwrap();
        assert_eq!(descriptor.soft_delete().unwrap().kind(), FieldKind::Other);
    }

    #[test]
    fn test_cast_accepts_matching_and_parsable_values() {
        assert_eq!(FieldKind::Integer.cast(&json!(5)), Some(json!(5)));
        assert_eq!(FieldKind::Integer.cast(&json!("42")), Some(json!(42)));
        assert_eq!(FieldKind::Boolean.cast(&json!("true")), Some(json!(true)));
        assert_eq!(FieldKind::Float.cast(&json!("1.5")), Some(json!(1.5)));
        assert_eq!(FieldKind::String.cast(&Value::Null), Some(Value::Null));
        assert_eq!(
            FieldKind::UtcDateTime.cast(&json!("2024-01-01T10:00:00Z")),
            Some(json!("2024-01-01T10:00:00Z"))
        );
        assert_eq!(FieldKind::Other.cast(&json!({"a": 1})), Some(json!({"a": 1})));
    }

    #[test]
    fn test_cast_rejects_mismatches() {
        assert_eq!(FieldKind::Integer.cast(&json!("abc")), None);
        assert_eq!(FieldKind::Integer.cast(&json!(1.5)), None);
        assert_eq!(FieldKind::String.cast(&json!(12)), None);
        assert_eq!(FieldKind::NaiveDateTime.cast(&json!("yesterday")), None);
    }

    #[test]
    fn test_parse_naive_accepts_dates_and_datetimes() {
        let midnight = parse_naive("2024-01-01").unwrap();
        assert_eq!(midnight.to_string(), "2024-01-01 00:00:00");
        assert!(parse_naive("2024-01-01T10:30:00").is_some());
        assert!(parse_naive("2024-01-01 10:30:00").is_some());
        assert!(parse_naive("2024-01-01T10:30:00Z").is_some());
    }

    #[test]
    fn test_parse_utc_reads_offsets() {
        let dt = parse_utc("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }
}
