//! Untyped request parameters
//!
//! [`RequestParams`] is the string-keyed map a list request arrives as. Most
//! values are plain text (`page`, `size`, `q`, `sort_by`, equality filters);
//! membership filters carry a list and range columns carry a map with
//! optional `after`/`before` keys.
//!
//! Flat query-string pairs are decoded with bracket conventions:
//!
//! | Pair | Value |
//! |---|---|
//! | `status=active` | `Text("active")` |
//! | `status[]=active&status[]=pending` | `List(["active", "pending"])` |
//! | `created_at[after]=2024-01-01` | `Map({"after": "2024-01-01"})` |
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::params::{ParamValue, RequestParams};
//!
//! let params = RequestParams::from_pairs([
//!     ("page", "2"),
//!     ("status[]", "active"),
//!     ("status[]", "pending"),
//!     ("created_at[after]", "2024-01-01"),
//! ]);
//!
//! assert_eq!(params.text("page"), Some("2"));
//! assert_eq!(
//!     params.get("status"),
//!     Some(&ParamValue::list(["active", "pending"]))
//! );
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One request parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A single text value
    Text(String),
    /// A list of values
    List(Vec<String>),
    /// A nested map of values
    Map(BTreeMap<String, String>),
}

impl ParamValue {
    /// Build a list value
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Build a map value
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The text value, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The list value, if this is one
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// The map value, if this is one
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<BTreeMap<String, String>> for ParamValue {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self::Map(entries)
    }
}

/// The raw parameter map of one list request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, ParamValue>);

impl RequestParams {
    /// Empty parameter map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode flat `(key, value)` pairs using bracket conventions
    ///
    /// A repeated plain key keeps its last value. A key whose shape changes
    /// (plain, then `[]`, then `[sub]`) takes the shape of its latest pair.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();

            if let Some(base) = key.strip_suffix("[]") {
                match params
                    .entry(base.to_string())
                    .or_insert_with(|| ParamValue::List(Vec::new()))
                {
                    ParamValue::List(values) => values.push(value),
                    other => *other = ParamValue::List(vec![value]),
                }
            } else if let Some((base, sub)) = split_bracketed(key) {
                match params
                    .entry(base.to_string())
                    .or_insert_with(|| ParamValue::Map(BTreeMap::new()))
                {
                    ParamValue::Map(entries) => {
                        entries.insert(sub.to_string(), value);
                    }
                    other => *other = ParamValue::map([(sub, value)]),
                }
            } else {
                params.insert(key.to_string(), ParamValue::Text(value));
            }
        }
        Self(params)
    }

    /// Add a parameter, replacing any previous value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a parameter, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Look up a text parameter
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split `base[sub]` into its parts
fn split_bracketed(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_suffix(']')?;
    let (base, sub) = inner.split_once('[')?;
    if base.is_empty() || sub.is_empty() {
        return None;
    }
    Some((base, sub))
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, ParamValue>> for RequestParams {
    fn from(params: BTreeMap<String, ParamValue>) -> Self {
        Self(params)
    }
}

impl From<std::collections::HashMap<String, String>> for RequestParams {
    fn from(params: std::collections::HashMap<String, String>) -> Self {
        params.into_iter().collect()
    }
}

#[cfg(feature = "http")]
mod extract {
    use axum::{
        extract::{FromRequestParts, Query},
        http::request::Parts,
    };

    use super::RequestParams;
    use crate::error::Error;

    impl<S> FromRequestParts<S> for RequestParams
    where
        S: Send + Sync,
    {
        type Rejection = Error;

        async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
            let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
                .await
                .map_err(|e| Error::validation(e.body_text()))?;
            Ok(RequestParams::from_pairs(pairs))
        }
    }
}
