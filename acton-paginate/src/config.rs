//! Configuration management using Figment
//!
//! Two layers live here:
//!
//! - [`PaginationConfig`]: per-entity capabilities (page sizes, sortable,
//!   filterable, searchable and rangeable columns). Each capability group is
//!   declared independently; a later declaration of a group replaces only
//!   that group.
//! - [`Config`]: service settings plus a table of per-entity pagination
//!   declarations, loaded with the following precedence (highest to lowest):
//!   1. Environment variables (prefix: `ACTON_PAGINATE_`, nested keys split on `__`)
//!   2. A TOML file (`./config.toml` by default)
//!   3. Default values
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::config::{ColumnSet, Declaration, PaginationConfig};
//!
//! let config = PaginationConfig::new()
//!     .with_size(10, 50)
//!     .with_sort(["name", "inserted_at"], Some("name"))
//!     .declare(Declaration::Search(ColumnSet::new(["name", "email"])));
//!
//! assert_eq!(config.size.max, 50);
//! assert!(config.sort.allows("inserted_at"));
//! assert!(config.filter.is_empty());
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Default upper bound on records per page
pub const MAX_PAGE_SIZE: i64 = 100;

/// Environment variable prefix for [`Config`]
pub const ENV_PREFIX: &str = "ACTON_PAGINATE_";

/// Page size declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConfig {
    /// Size used when the request carries none
    #[serde(default = "default_page_size")]
    pub default: i64,

    /// Upper bound applied to requested sizes
    #[serde(default = "default_max_page_size")]
    pub max: i64,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

/// Sort declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Columns a request may sort on
    #[serde(default)]
    pub on: Vec<String>,

    /// Sort used when the request names none, optionally `-`-prefixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl SortConfig {
    /// Whether the column may be sorted on
    pub fn allows(&self, column: &str) -> bool {
        self.on.iter().any(|c| c == column)
    }
}

/// A set of allowed columns for filter, search or range declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    /// Allowed columns, in declaration order
    #[serde(default)]
    pub on: Vec<String>,
}

impl ColumnSet {
    /// Create a column set
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            on: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the column is allowed
    pub fn allows(&self, column: &str) -> bool {
        self.on.iter().any(|c| c == column)
    }

    /// Whether no column is allowed
    pub fn is_empty(&self) -> bool {
        self.on.is_empty()
    }

    /// Iterate over allowed columns
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.on.iter().map(String::as_str)
    }
}

/// One capability-group declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Page size bounds
    Size(SizeConfig),
    /// Sortable columns and default sort
    Sort(SortConfig),
    /// Columns accepted as equality/membership filters
    Filter(ColumnSet),
    /// Columns searched by the `q` term
    Search(ColumnSet),
    /// Columns accepting `after`/`before` bounds
    Range(ColumnSet),
}

/// Per-entity pagination capabilities
///
/// Undeclared groups keep their defaults: size 20 (max 100), no sort, and
/// empty filter, search and range sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size bounds
    pub size: SizeConfig,
    /// Sortable columns and default sort
    pub sort: SortConfig,
    /// Filterable columns
    pub filter: ColumnSet,
    /// Searchable columns
    pub search: ColumnSet,
    /// Rangeable columns
    pub range: ColumnSet,
}

impl PaginationConfig {
    /// Configuration with every group at its default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence of declarations; later declarations of the same group win
    pub fn from_declarations(declarations: impl IntoIterator<Item = Declaration>) -> Self {
        declarations
            .into_iter()
            .fold(Self::default(), Self::declare)
    }

    /// Apply one declaration, replacing only its own group
    #[must_use]
    pub fn declare(mut self, declaration: Declaration) -> Self {
        match declaration {
            Declaration::Size(size) => self.size = size,
            Declaration::Sort(sort) => self.sort = sort,
            Declaration::Filter(columns) => self.filter = columns,
            Declaration::Search(columns) => self.search = columns,
            Declaration::Range(columns) => self.range = columns,
        }
        self
    }

    /// Declare page size bounds
    #[must_use]
    pub fn with_size(self, default: i64, max: i64) -> Self {
        self.declare(Declaration::Size(SizeConfig { default, max }))
    }

    /// Declare sortable columns and an optional default sort
    #[must_use]
    pub fn with_sort<I, S>(self, on: I, default: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(Declaration::Sort(SortConfig {
            on: on.into_iter().map(Into::into).collect(),
            default: default.map(str::to_string),
        }))
    }

    /// Declare filterable columns
    #[must_use]
    pub fn with_filter<I, S>(self, on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(Declaration::Filter(ColumnSet::new(on)))
    }

    /// Declare searchable columns
    #[must_use]
    pub fn with_search<I, S>(self, on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(Declaration::Search(ColumnSet::new(on)))
    }

    /// Declare rangeable columns
    #[must_use]
    pub fn with_range<I, S>(self, on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(Declaration::Range(ColumnSet::new(on)))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Pagination declarations keyed by entity name
    #[serde(default)]
    pub entities: BTreeMap<String, PaginationConfig>,

    /// PostgreSQL connection settings, used by `PgStore`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing the connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts in seconds, doubled after each failure
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl DatabaseConfig {
    /// Settings for a URL with every other value at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_secs: default_connection_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

fn default_max_connections() -> u32 {
    50
}

fn default_min_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> i64 {
    MAX_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `./config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
        } else {
            tracing::debug!("No configuration file at {}", path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    /// Extract configuration from a prepared figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config = figment.extract()?;
        Ok(config)
    }

    /// Pagination declarations for an entity, or the defaults when none were declared
    pub fn pagination_for(&self, entity: &str) -> PaginationConfig {
        self.entities.get(entity).cloned().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "acton-paginate".to_string(),
                log_level: default_log_level(),
            },
            entities: BTreeMap::new(),
            database: None,
        }
    }
}
