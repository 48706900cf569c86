//! # acton-paginate
//!
//! Criteria parsing, dynamic query composition and soft-delete aware
//! pagination in front of a pluggable record store.
//!
//! ## Features
//!
//! - **Criteria parsing**: `page`, `size`, `q` and `sort_by` validated against per-entity declarations
//! - **Query composition**: visibility, search, range, filter, sort and window applied in a fixed order
//! - **Two-query pagination**: an unwindowed count followed by a windowed fetch
//! - **Soft delete**: deleted rows are invisible to every read; deletes stamp a timestamp
//! - **Stores**: in-memory out of the box, PostgreSQL via `sqlx` with the `database` feature
//! - **HTTP**: axum extractor for request parameters, JSON responses for pages and errors
//!
//! ## Example
//!
//! ```rust
//! use acton_paginate::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let users = EntityDescriptor::builder("users")
//!         .field("name", FieldKind::String)
//!         .field("status", FieldKind::String)
//!         .field("created_at", FieldKind::NaiveDateTime)
//!         .build()?;
//!
//!     let repo = Repository::builder()
//!         .store(MemoryStore::new())
//!         .entity(users)
//!         .pagination(
//!             PaginationConfig::new()
//!                 .with_sort(["name"], Some("name"))
//!                 .with_filter(["status"])
//!                 .with_search(["name"])
//!                 .with_range(["created_at"]),
//!         )
//!         .build()?;
//!
//!     for name in ["bob", "bobby", "alice"] {
//!         repo.save(None, &json!({"name": name, "status": "active"})).await?;
//!     }
//!
//!     let params = RequestParams::from_pairs([("q", "bob"), ("sort_by", "-name"), ("size", "1")]);
//!     let page = repo.paginate(&params).await?;
//!
//!     assert_eq!(page.total, 2);
//!     assert_eq!(page.results[0].get("name"), Some(&json!("bobby")));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod observability;
pub mod page;
pub mod params;
pub mod query;
pub mod record;
pub mod repository;
pub mod schema;
pub mod soft_delete;
pub mod store;

pub use config::{Config, PaginationConfig};
pub use criteria::Criteria;
pub use engine::paginate;
pub use error::{Error, Result};
pub use page::Page;
pub use params::RequestParams;
pub use record::Record;
pub use repository::Repository;
pub use schema::EntityDescriptor;
pub use store::{MemoryStore, Store};

#[cfg(feature = "database")]
pub use store::PgStore;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ColumnSet, Config, DatabaseConfig, Declaration, PaginationConfig, SizeConfig, SortConfig,
    };
    pub use crate::criteria::{Criteria, SortSpec};
    pub use crate::engine::paginate;
    pub use crate::error::{Error, FieldViolation, Result};
    pub use crate::observability::init_tracing;
    pub use crate::page::{Links, Page};
    pub use crate::params::{ParamValue, RequestParams};
    pub use crate::query::{FilterValue, OrderDirection, Predicate, Query, QueryComposer};
    pub use crate::record::Record;
    pub use crate::repository::{Repository, RepositoryBuilder};
    pub use crate::schema::{EntityDescriptor, FieldKind, TemporalKind};
    pub use crate::store::{
        MemoryStore, Store, StoreError, StoreErrorKind, StoreOperation, StoreResult, TemporalValue,
    };

    #[cfg(feature = "database")]
    pub use crate::store::PgStore;
}
