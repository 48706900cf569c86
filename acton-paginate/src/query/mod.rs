//! Composable query values
//!
//! A [`Query`] is an immutable description of a read against one entity: the
//! predicates that must all hold, an ordering, and an optional window. Each
//! builder method consumes the query and returns the extended one, so every
//! composition stage is a plain function from query to query.
//!
//! - [`Predicate`] and [`FilterValue`]: the conditions a query may carry
//! - [`QueryComposer`]: turns parsed [`Criteria`](crate::criteria::Criteria) into a query
//! - [`sql`]: renders queries as parameterized PostgreSQL
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::query::{OrderDirection, Predicate, Query};
//!
//! let query = Query::new("users")
//!     .filter(Predicate::is_null("deleted_at"))
//!     .filter(Predicate::eq("status", "active"))
//!     .order_by("name", OrderDirection::Descending)
//!     .with_limit(10)
//!     .with_offset(20);
//!
//! assert_eq!(query.source(), "users");
//! assert_eq!(query.predicates().len(), 2);
//! assert_eq!(query.limit(), Some(10));
//! assert!(query.unpaged().limit().is_none());
//! ```

mod compose;
mod predicate;
pub mod sql;

pub use compose::{window, QueryComposer, RANGE_AFTER, RANGE_BEFORE};
pub use predicate::{FilterValue, Order, OrderDirection, Predicate};

use crate::schema::EntityDescriptor;

/// An immutable, accumulating read description
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    predicates: Vec<Predicate>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Match every row of the named entity
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Match every row of the described entity
    pub fn for_entity(descriptor: &EntityDescriptor) -> Self {
        Self::new(descriptor.name())
    }

    /// Add a predicate; all predicates must hold
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append an ordering term
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order.push(Order {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of rows returned
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip leading rows
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The same query without ordering or window, as used for counting
    #[must_use]
    pub fn unpaged(mut self) -> Self {
        self.order.clear();
        self.limit = None;
        self.offset = None;
        self
    }

    /// Entity the query reads from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Predicates, in the order they were added
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Ordering terms
    pub fn order(&self) -> &[Order] {
        &self.order
    }

    /// Row cap, if any
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Rows skipped, if any
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}
