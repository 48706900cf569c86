//! Criteria-to-query composition
//!
//! [`QueryComposer`] applies a fixed sequence of stages to a base query:
//!
//! 1. Visibility: soft-deleted rows are excluded when soft delete is enabled
//! 2. Search: the term matches any searchable column, ignoring case
//! 3. Range: inclusive `after`/`before` bounds on rangeable columns
//! 4. Filter: membership for list values, equality otherwise
//! 5. Sort: the validated sort column and direction
//! 6. Window: `LIMIT size OFFSET (page - 1) * size`, only when `size > 0`
//!
//! Stages 1-4 produce the filtered query, which is what gets counted.
//! Stages 5-6 are layered only onto the query that fetches the page.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::config::PaginationConfig;
//! use acton_paginate::criteria::Criteria;
//! use acton_paginate::params::RequestParams;
//! use acton_paginate::query::{Query, QueryComposer};
//! use acton_paginate::schema::EntityDescriptor;
//!
//! let users = EntityDescriptor::builder("users").build().unwrap();
//! let config = PaginationConfig::new().with_filter(["status"]);
//! let criteria = Criteria::parse(
//!     &RequestParams::from_pairs([("status", "active"), ("size", "5")]),
//!     &config,
//! )
//! .unwrap();
//!
//! let composer = QueryComposer::new(&config, &users);
//! let filtered = composer.filtered(Query::for_entity(&users), &criteria);
//! assert_eq!(filtered.predicates().len(), 1);
//! assert_eq!(filtered.limit(), None);
//!
//! let page = composer.windowed(filtered, &criteria);
//! assert_eq!(page.limit(), Some(5));
//! ```

use super::{FilterValue, Predicate, Query};
use crate::config::PaginationConfig;
use crate::criteria::{Criteria, SortSpec};
use crate::params::{ParamValue, RequestParams};
use crate::schema::EntityDescriptor;
use crate::soft_delete;

/// Lower bound key inside a range parameter
pub const RANGE_AFTER: &str = "after";

/// Upper bound key inside a range parameter
pub const RANGE_BEFORE: &str = "before";

/// Composes queries for one entity from parsed criteria
#[derive(Debug, Clone, Copy)]
pub struct QueryComposer<'a> {
    config: &'a PaginationConfig,
    descriptor: &'a EntityDescriptor,
}

impl<'a> QueryComposer<'a> {
    /// Create a composer over an entity's declarations
    pub fn new(config: &'a PaginationConfig, descriptor: &'a EntityDescriptor) -> Self {
        Self { config, descriptor }
    }

    /// Apply every stage: the query that fetches the page
    pub fn compose(&self, base: Query, criteria: &Criteria) -> Query {
        self.windowed(self.filtered(base, criteria), criteria)
    }

    /// Apply visibility, search, range and filter: the query that is counted
    pub fn filtered(&self, base: Query, criteria: &Criteria) -> Query {
        let query = self.visibility(base);
        let query = self.search(query, criteria.search_term());
        let query = self.range(query, criteria.params());
        self.filter(query, criteria.params())
    }

    /// Apply sort and window to a filtered query
    pub fn windowed(&self, filtered: Query, criteria: &Criteria) -> Query {
        let query = self.sort(filtered, criteria.sort());
        window(query, criteria.limit(), criteria.offset())
    }

    /// Exclude soft-deleted rows when soft delete is enabled
    pub fn visibility(&self, query: Query) -> Query {
        soft_delete::restrict(query, self.descriptor)
    }

    /// Match the term as a substring of any searchable column
    pub fn search(&self, query: Query, term: Option<&str>) -> Query {
        let Some(term) = term.filter(|t| !t.is_empty()) else {
            return query;
        };
        if self.config.search.is_empty() {
            return query;
        }
        query.filter(Predicate::any(
            self.config
                .search
                .iter()
                .map(|column| Predicate::contains(column, term)),
        ))
    }

    /// Bound rangeable columns by their `after` and `before` values
    ///
    /// Columns absent from the request, or present with anything other than
    /// a map, are skipped. Empty bounds are ignored.
    pub fn range(&self, query: Query, params: &RequestParams) -> Query {
        self.config.range.iter().fold(query, |query, column| {
            let Some(bounds) = params.get(column).and_then(ParamValue::as_map) else {
                return query;
            };
            let bound = |key: &str| {
                bounds
                    .get(key)
                    .filter(|raw| !raw.is_empty())
                    .map(|raw| self.coerce(column, raw))
            };

            let query = match bound(RANGE_AFTER) {
                Some(after) => query.filter(Predicate::gte(column, after)),
                None => query,
            };
            match bound(RANGE_BEFORE) {
                Some(before) => query.filter(Predicate::lte(column, before)),
                None => query,
            }
        })
    }

    /// Apply membership for list values and equality for text values
    pub fn filter(&self, query: Query, params: &RequestParams) -> Query {
        self.config
            .filter
            .iter()
            .fold(query, |query, column| match params.get(column) {
                Some(ParamValue::List(values)) => query.filter(Predicate::in_list(
                    column,
                    values.iter().map(|raw| self.coerce(column, raw)).collect(),
                )),
                Some(ParamValue::Text(raw)) => {
                    query.filter(Predicate::eq(column, self.coerce(column, raw)))
                }
                Some(ParamValue::Map(_)) => {
                    tracing::trace!(column, "ignoring map value for filter column");
                    query
                }
                None => query,
            })
    }

    /// Order by the validated sort, if any
    pub fn sort(&self, query: Query, sort: Option<&SortSpec>) -> Query {
        match sort {
            Some(spec) => query.order_by(spec.column.as_str(), spec.direction),
            None => query,
        }
    }

    fn coerce(&self, column: &str, raw: &str) -> FilterValue {
        FilterValue::coerce(raw, self.descriptor.field_kind(column))
    }
}

/// Apply limit and offset when present
pub fn window(query: Query, limit: Option<u64>, offset: Option<u64>) -> Query {
    let query = match limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    };
    match offset {
        Some(offset) => query.with_offset(offset),
        None => query,
    }
}
