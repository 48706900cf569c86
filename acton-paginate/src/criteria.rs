//! Criteria parsing
//!
//! [`Criteria::parse`] turns raw [`RequestParams`] plus an entity's
//! [`PaginationConfig`] into a validated, normalized page request.
//!
//! | Parameter | Missing | Present |
//! |---|---|---|
//! | `page` | `1` | integer `>= 1`, anything else is a validation error |
//! | `size` | `size.default`, capped at `size.max` | integer, capped at `size.max`; non-numeric is a validation error |
//! | `q` | none | kept verbatim unless blank |
//! | `sort_by` | `sort.default` | `-` prefix for descending; a column not in `sort.on` means no sort |
//!
//! The raw parameters are retained so filter and range values can be read
//! later by column name.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::config::PaginationConfig;
//! use acton_paginate::criteria::Criteria;
//! use acton_paginate::params::RequestParams;
//! use acton_paginate::query::OrderDirection;
//!
//! let config = PaginationConfig::new().with_sort(["name"], None);
//! let params = RequestParams::from_pairs([("page", "3"), ("size", "10"), ("sort_by", "-name")]);
//!
//! let criteria = Criteria::parse(&params, &config).unwrap();
//! assert_eq!(criteria.page(), 3);
//! assert_eq!(criteria.offset(), Some(20));
//! assert_eq!(criteria.sort().unwrap().direction, OrderDirection::Descending);
//! ```

use std::fmt;

use crate::config::{PaginationConfig, SortConfig};
use crate::error::{Error, Result};
use crate::params::{ParamValue, RequestParams};
use crate::query::OrderDirection;

/// Request key for the 1-based page number
pub const PAGE_PARAM: &str = "page";

/// Request key for the page size
pub const SIZE_PARAM: &str = "size";

/// Request key for the search term
pub const SEARCH_PARAM: &str = "q";

/// Request key for the sort specification
pub const SORT_PARAM: &str = "sort_by";

const DESCENDING_MARKER: char = '-';

/// A validated sort: an allowed column and a direction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    /// Column to sort on
    pub column: String,
    /// Direction
    pub direction: OrderDirection,
}

impl SortSpec {
    /// Read a `-`-prefixed sort string, keeping it only if the column may be sorted on
    pub fn parse(raw: &str, sort: &SortConfig) -> Option<Self> {
        let (column, direction) = match raw.strip_prefix(DESCENDING_MARKER) {
            Some(column) => (column, OrderDirection::Descending),
            None => (raw, OrderDirection::Ascending),
        };
        sort.allows(column).then(|| Self {
            column: column.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            OrderDirection::Ascending => write!(f, "{}", self.column),
            OrderDirection::Descending => write!(f, "{}{}", DESCENDING_MARKER, self.column),
        }
    }
}

/// Validated, normalized representation of one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    page: u64,
    size: i64,
    search_term: Option<String>,
    sort: Option<SortSpec>,
    params: RequestParams,
}

impl Criteria {
    /// Parse and validate request parameters against an entity's declarations
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `page` is not a positive integer or
    /// `size` is not an integer.
    pub fn parse(params: &RequestParams, config: &PaginationConfig) -> Result<Self> {
        let page = parse_page(params.get(PAGE_PARAM))?;
        let size = parse_size(params.get(SIZE_PARAM), config)?;

        let search_term = params
            .text(SEARCH_PARAM)
            .filter(|term| !term.trim().is_empty())
            .map(str::to_string);

        let sort = match params.get(SORT_PARAM) {
            Some(value) => value
                .as_text()
                .and_then(|raw| SortSpec::parse(raw, &config.sort)),
            None => config
                .sort
                .default
                .as_deref()
                .and_then(|raw| SortSpec::parse(raw, &config.sort)),
        };

        Ok(Self {
            page,
            size,
            search_term,
            sort,
            params: params.clone(),
        })
    }

    /// 1-based page number
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Requested page size, capped at the configured maximum
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Search term, if one was given
    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    /// Validated sort, if any
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// The raw request parameters, unchanged
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Row cap for the fetch; `None` when size is zero or negative
    pub fn limit(&self) -> Option<u64> {
        u64::try_from(self.size).ok().filter(|size| *size > 0)
    }

    /// Rows to skip, `(page - 1) * size`; `None` whenever there is no limit
    pub fn offset(&self) -> Option<u64> {
        self.limit()
            .map(|size| self.page.saturating_sub(1).saturating_mul(size))
    }
}

fn parse_page(value: Option<&ParamValue>) -> Result<u64> {
    let Some(value) = value else {
        return Ok(1);
    };
    value
        .as_text()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|page| *page >= 1)
        .ok_or_else(|| Error::validation(format!("`{PAGE_PARAM}` must be a positive integer")))
}

fn parse_size(value: Option<&ParamValue>, config: &PaginationConfig) -> Result<i64> {
    let Some(value) = value else {
        return Ok(config.size.default.min(config.size.max));
    };
    value
        .as_text()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|size| size.min(config.size.max))
        .ok_or_else(|| Error::validation(format!("`{SIZE_PARAM}` must be an integer")))
}
