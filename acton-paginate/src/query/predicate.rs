//! Predicates, values and ordering for composed queries
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::query::{FilterValue, OrderDirection, Predicate};
//!
//! let status = Predicate::in_list("status", vec!["active".into(), "pending".into()]);
//! let recent = Predicate::gte("created_at", "2024-01-01");
//! let named = Predicate::any([Predicate::contains("name", "bob")]);
//!
//! assert_eq!(format!("{}", OrderDirection::Descending), "desc");
//! assert_eq!(FilterValue::from(42_i64), FilterValue::Integer(42));
//! # let _ = (status, recent, named);
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::schema::{parse_naive, parse_utc, FieldKind};

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl OrderDirection {
    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One ordering term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    /// Field to order by
    pub field: String,
    /// Direction
    pub direction: OrderDirection,
}

/// A value compared against in predicates, or bound into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text
    String(String),
    /// 64-bit integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// Timestamp without zone
    NaiveDateTime(NaiveDateTime),
    /// Timestamp in UTC
    UtcDateTime(DateTime<Utc>),
    /// Structured document
    Json(Value),
    /// SQL NULL
    Null,
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::NaiveDateTime(dt)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::UtcDateTime(dt)
    }
}

impl FilterValue {
    /// Coerce request text to the declared field kind
    ///
    /// Text that does not parse as the declared kind stays text.
    pub fn coerce(raw: &str, kind: Option<FieldKind>) -> Self {
        let parsed = match kind {
            Some(FieldKind::Integer) => raw.trim().parse::<i64>().ok().map(Self::Integer),
            Some(FieldKind::Float) => raw.trim().parse::<f64>().ok().map(Self::Float),
            Some(FieldKind::Boolean) => raw.trim().parse::<bool>().ok().map(Self::Boolean),
            Some(FieldKind::NaiveDateTime) => parse_naive(raw).map(Self::NaiveDateTime),
            Some(FieldKind::UtcDateTime) => parse_utc(raw).map(Self::UtcDateTime),
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::String(raw.to_string()))
    }

    /// Read a stored JSON value as the declared field kind
    pub fn from_json(value: &Value, kind: Option<FieldKind>) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match (kind, n.as_i64()) {
                (Some(FieldKind::Float), _) | (_, None) => {
                    n.as_f64().map_or_else(|| Self::Json(value.clone()), Self::Float)
                }
                (_, Some(i)) => Self::Integer(i),
            },
            Value::String(s) => Self::coerce(s, kind),
            Value::Array(_) | Value::Object(_) => Self::Json(value.clone()),
        }
    }

    /// Render as JSON, timestamps as ISO-8601 text
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::Boolean(b) => Value::Bool(*b),
            Self::NaiveDateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::UtcDateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Json(v) => v.clone(),
            Self::Null => Value::Null,
        }
    }

    /// Whether this is [`FilterValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare two values of compatible kinds; `None` for incomparable pairs and nulls
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use FilterValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => Some(a.cmp(b)),
            (V::Integer(a), V::Integer(b)) => Some(a.cmp(b)),
            (V::Integer(a), V::Float(b)) => (*a as f64).partial_cmp(b),
            (V::Float(a), V::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (V::Float(a), V::Float(b)) => a.partial_cmp(b),
            (V::Boolean(a), V::Boolean(b)) => Some(a.cmp(b)),
            (V::NaiveDateTime(a), V::NaiveDateTime(b)) => Some(a.cmp(b)),
            (V::UtcDateTime(a), V::UtcDateTime(b)) => Some(a.cmp(b)),
            (V::NaiveDateTime(a), V::UtcDateTime(b)) => Some(a.cmp(&b.naive_utc())),
            (V::UtcDateTime(a), V::NaiveDateTime(b)) => Some(a.naive_utc().cmp(b)),
            (V::Json(a), V::Json(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Text used for substring search
    pub fn search_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::String(s) => Some(s.clone()),
            other => match other.to_json() {
                Value::String(s) => Some(s),
                v => Some(v.to_string()),
            },
        }
    }
}

/// A condition restricting the rows a query matches
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field is unset (IS NULL)
    IsNull {
        /// Field name
        field: String,
    },
    /// Field equals value
    Eq {
        /// Field name
        field: String,
        /// Value to compare against
        value: FilterValue,
    },
    /// Field is one of the listed values
    In {
        /// Field name
        field: String,
        /// Accepted values
        values: Vec<FilterValue>,
    },
    /// Field is at or after the bound (inclusive)
    Gte {
        /// Field name
        field: String,
        /// Lower bound
        value: FilterValue,
    },
    /// Field is at or before the bound (inclusive)
    Lte {
        /// Field name
        field: String,
        /// Upper bound
        value: FilterValue,
    },
    /// Field contains the term, ignoring case
    Contains {
        /// Field name
        field: String,
        /// Search term
        term: String,
    },
    /// Any of the inner predicates holds
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Create an IS NULL predicate
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    /// Create an equality predicate (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a membership predicate (field IN values)
    pub fn in_list(field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Create an inclusive lower bound (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an inclusive upper bound (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a case-insensitive substring predicate
    pub fn contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Create a disjunction
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Any(predicates.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_direction_display_and_sql() {
        assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
        assert_eq!(format!("{}", OrderDirection::Descending), "desc");
        assert_eq!(OrderDirection::Ascending.as_sql(), "ASC");
        assert_eq!(OrderDirection::Descending.as_sql(), "DESC");
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
    }

    #[test]
    fn test_filter_value_from_primitives() {
        assert_eq!(FilterValue::from("x"), FilterValue::String("x".to_string()));
        assert_eq!(FilterValue::from(42_i32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));
    }

    #[test]
    fn test_coerce_by_kind() {
        assert_eq!(
            FilterValue::coerce("7", Some(FieldKind::Integer)),
            FilterValue::Integer(7)
        );
        assert_eq!(
            FilterValue::coerce("seven", Some(FieldKind::Integer)),
            FilterValue::String("seven".to_string())
        );
        assert_eq!(
            FilterValue::coerce("false", Some(FieldKind::Boolean)),
            FilterValue::Boolean(false)
        );
        assert_eq!(
            FilterValue::coerce("7", None),
            FilterValue::String("7".to_string())
        );
        assert!(matches!(
            FilterValue::coerce("2024-01-01", Some(FieldKind::NaiveDateTime)),
            FilterValue::NaiveDateTime(_)
        ));
        assert!(matches!(
            FilterValue::coerce("2024-01-01T00:00:00Z", Some(FieldKind::UtcDateTime)),
            FilterValue::UtcDateTime(_)
        ));
    }

    #[test]
    fn test_from_json_respects_kind() {
        assert_eq!(FilterValue::from_json(&json!(3), None), FilterValue::Integer(3));
        assert_eq!(
            FilterValue::from_json(&json!(3), Some(FieldKind::Float)),
            FilterValue::Float(3.0)
        );
        assert_eq!(FilterValue::from_json(&Value::Null, None), FilterValue::Null);
        assert_eq!(
            FilterValue::from_json(&json!(["a"]), None),
            FilterValue::Json(json!(["a"]))
        );
    }

    #[test]
    fn test_compare_mixed_numbers_and_timestamps() {
        assert_eq!(
            FilterValue::Integer(2).compare(&FilterValue::Float(2.5)),
            Some(Ordering::Less)
        );
        let day = FilterValue::coerce("2024-01-02", Some(FieldKind::NaiveDateTime));
        let earlier = FilterValue::coerce("2024-01-01T12:00:00Z", Some(FieldKind::UtcDateTime));
        assert_eq!(day.compare(&earlier), Some(Ordering::Greater));
        assert_eq!(FilterValue::Null.compare(&FilterValue::Null), None);
        assert_eq!(
            FilterValue::String("1".into()).compare(&FilterValue::Integer(1)),
            None
        );
    }

    #[test]
    fn test_timestamp_json_rendering() {
        let naive = FilterValue::coerce("2024-01-01T10:00:00", Some(FieldKind::NaiveDateTime));
        assert_eq!(naive.to_json(), json!("2024-01-01T10:00:00"));
        let utc = FilterValue::coerce("2024-01-01T10:00:00Z", Some(FieldKind::UtcDateTime));
        assert_eq!(utc.to_json(), json!("2024-01-01T10:00:00Z"));
    }

    #[test]
    fn test_predicate_constructors() {
        assert_eq!(
            Predicate::is_null("deleted_at"),
            Predicate::IsNull {
                field: "deleted_at".to_string()
            }
        );
        assert_eq!(
            Predicate::eq("status", "active"),
            Predicate::Eq {
                field: "status".to_string(),
                value: FilterValue::String("active".to_string())
            }
        );
        let any = Predicate::any([Predicate::contains("name", "bob")]);
        assert!(matches!(any, Predicate::Any(ref inner) if inner.len() == 1));
    }
}
