//! Store abstraction
//!
//! The engine reads and writes through a [`Store`]. Reads take a composed
//! [`Query`]; writes take an [`EntityDescriptor`] and a [`Record`]. The trait
//! uses RPITIT (Return Position Impl Trait In Traits), so implementations
//! write plain `async fn`s without `async_trait`.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: an in-process backend that evaluates queries directly
//! - `PgStore` (feature `database`): PostgreSQL through `sqlx`
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::query::{Predicate, Query};
//! use acton_paginate::record::Record;
//! use acton_paginate::schema::{EntityDescriptor, FieldKind};
//! use acton_paginate::store::{MemoryStore, Store};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let users = EntityDescriptor::builder("users")
//!     .field("name", FieldKind::String)
//!     .build()?;
//! let store = MemoryStore::new();
//! store.register(&users).await;
//!
//! store.insert(&users, Record::new().with("name", "alice")).await?;
//! let total = store.count(&Query::new("users").filter(Predicate::eq("name", "alice"))).await?;
//! assert_eq!(total, 1);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde_json::Value;

pub use error::{StoreError, StoreErrorKind, StoreOperation};
pub use memory::MemoryStore;
#[cfg(feature = "database")]
pub use postgres::PgStore;

use crate::query::Query;
use crate::record::Record;
use crate::schema::{EntityDescriptor, TemporalKind};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A timestamp of one of the two supported temporal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalValue {
    /// Date and time without a zone
    Naive(NaiveDateTime),
    /// Date and time in UTC
    Utc(DateTime<Utc>),
}

impl TemporalValue {
    /// The current time as the given kind, truncated to whole seconds
    pub fn now(kind: TemporalKind) -> Self {
        let now = Utc::now().trunc_subsecs(0);
        match kind {
            TemporalKind::Naive => Self::Naive(now.naive_utc()),
            TemporalKind::Utc => Self::Utc(now),
        }
    }

    /// Kind of this value
    pub fn kind(&self) -> TemporalKind {
        match self {
            Self::Naive(_) => TemporalKind::Naive,
            Self::Utc(_) => TemporalKind::Utc,
        }
    }

    /// ISO-8601 text; naive values carry no zone, UTC values end in `Z`
    pub fn to_json(&self) -> Value {
        match self {
            Self::Naive(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Self::Utc(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }
}

impl From<TemporalValue> for Value {
    fn from(value: TemporalValue) -> Self {
        value.to_json()
    }
}

/// Persistence backend the engine reads and writes through
///
/// Implementations report failures as [`StoreError`]. Rejections of a write on
/// schema-level grounds use [`StoreErrorKind::ValidationFailed`] or
/// [`StoreErrorKind::ConstraintViolation`]; writes against a missing row use
/// [`StoreErrorKind::NotFound`].
pub trait Store: Send + Sync {
    /// Count rows matching the query's predicates
    ///
    /// Ordering and window are ignored.
    fn count(&self, query: &Query) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Fetch rows matching the query, ordered and windowed
    fn fetch(&self, query: &Query) -> impl Future<Output = StoreResult<Vec<Record>>> + Send;

    /// Fetch the first matching row, if any
    fn fetch_one(&self, query: &Query)
        -> impl Future<Output = StoreResult<Option<Record>>> + Send;

    /// Insert a record, returning it as stored (with generated fields)
    fn insert(
        &self,
        entity: &EntityDescriptor,
        record: Record,
    ) -> impl Future<Output = StoreResult<Record>> + Send;

    /// Update the record identified by its primary key, returning it as stored
    fn update(
        &self,
        entity: &EntityDescriptor,
        record: Record,
    ) -> impl Future<Output = StoreResult<Record>> + Send;

    /// Physically remove the record identified by its primary key
    fn remove(
        &self,
        entity: &EntityDescriptor,
        record: &Record,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// The store's notion of "now" for the given kind
    fn now(&self, kind: TemporalKind) -> TemporalValue {
        TemporalValue::now(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_has_requested_kind() {
        assert_eq!(TemporalValue::now(TemporalKind::Naive).kind(), TemporalKind::Naive);
        assert_eq!(TemporalValue::now(TemporalKind::Utc).kind(), TemporalKind::Utc);
    }

    #[test]
    fn test_to_json_formats() {
        let naive = "2024-01-01T10:00:00".parse::<NaiveDateTime>().unwrap();
        assert_eq!(
            TemporalValue::Naive(naive).to_json(),
            Value::String("2024-01-01T10:00:00".to_string())
        );
        assert_eq!(
            TemporalValue::Utc(naive.and_utc()).to_json(),
            Value::String("2024-01-01T10:00:00Z".to_string())
        );
    }

    #[test]
    fn test_now_is_whole_seconds() {
        match TemporalValue::now(TemporalKind::Utc) {
            TemporalValue::Utc(dt) => assert_eq!(dt.timestamp_subsec_nanos(), 0),
            other => panic!("unexpected {other:?}"),
        }
    }
}
