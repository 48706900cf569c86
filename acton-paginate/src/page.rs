//! Page results
//!
//! A [`Page`] carries one window of records and the total number of records
//! matching the request's filters. Link slots are reserved but never filled
//! by the engine.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::page::Page;
//! use serde_json::json;
//!
//! let page = Page::new(42, vec!["a", "b"]);
//! assert_eq!(
//!     serde_json::to_value(&page).unwrap(),
//!     json!({
//!         "links": {"prev": null, "self": null, "next": null},
//!         "total": 42,
//!         "results": ["a", "b"]
//!     })
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Navigation links; always empty as produced by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Previous page
    pub prev: Option<String>,
    /// This page
    #[serde(rename = "self")]
    pub current: Option<String>,
    /// Next page
    pub next: Option<String>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Record> {
    /// Navigation links
    pub links: Links,
    /// Number of records matching the filters, across all pages
    pub total: u64,
    /// Records on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page with empty links
    pub fn new(total: u64, results: Vec<T>) -> Self {
        Self {
            links: Links::default(),
            total,
            results,
        }
    }

    /// Convert every result, keeping links and total
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            links: self.links,
            total: self.total,
            results: self.results.into_iter().map(f).collect(),
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether this page holds no records
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(feature = "http")]
impl<T: Serialize> axum::response::IntoResponse for Page<T> {
    fn into_response(self) -> axum::response::Response {
        (axum::http::StatusCode::OK, axum::Json(self)).into_response()
    }
}
