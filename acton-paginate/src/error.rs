//! Error types and HTTP response conversion
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! distinguishes the failure categories callers care about:
//!
//! - [`Error::Validation`]: malformed input at the boundary (bad `page`, non-map attributes)
//! - [`Error::Configuration`]: registration or descriptor problems
//! - [`Error::Persistence`]: the store rejected a write on schema-level grounds
//! - [`Error::NotFound`]: a strict lookup found nothing
//! - [`Error::Store`]: any other store failure, passed through untouched
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::error::{Error, FieldViolation};
//!
//! let error = Error::persistence("users", vec![FieldViolation::new("email", "can't be blank")]);
//! assert!(error.is_persistence());
//! assert_eq!(error.to_string(), "Persistence error on users: email can't be blank");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level problem reported while casting or persisting attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field the violation applies to (`base` for record-wide problems)
    pub field: String,
    /// Human-readable description
    pub message: String,
}

impl FieldViolation {
    /// Create a new field violation
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input (non-numeric page/size, non-map attributes, unusable id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration or descriptor problem, surfaced at the point of use
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The store rejected an insert or update on schema-level grounds
    #[error("Persistence error on {entity}: {}", join_violations(.violations))]
    Persistence {
        /// Entity the write targeted
        entity: String,
        /// Violations reported by the cast or by the store
        violations: Vec<FieldViolation>,
    },

    /// A strict lookup found no visible record
    #[error("Not found: {entity} {id}")]
    NotFound {
        /// Entity that was searched
        entity: String,
        /// Identifier that was requested
        id: String,
    },

    /// Any other failure reported by the store
    #[error(transparent)]
    Store(StoreError),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a persistence error
    pub fn persistence(entity: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self::Persistence {
            entity: entity.into(),
            violations,
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is a [`Error::Validation`]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a [`Error::Configuration`]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is a [`Error::Persistence`]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Whether this is a [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Promote a write rejection to [`Error::Persistence`], pass anything else through
    pub(crate) fn from_write(entity: &str, err: StoreError) -> Self {
        if !err.is_rejection() {
            return Self::Store(err);
        }
        let violations = if err.violations.is_empty() {
            vec![FieldViolation::new("base", err.message)]
        } else {
            err.violations
        };
        Self::persistence(entity, violations)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(feature = "http")]
mod response {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde::Serialize;

    use super::{Error, FieldViolation};
    use crate::store::StoreErrorKind;

    /// JSON body returned for API errors
    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: String,
        code: String,
        status: u16,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        violations: Vec<FieldViolation>,
    }

    impl Error {
        /// HTTP status code for this error
        pub fn status_code(&self) -> StatusCode {
            match self {
                Self::Validation(_) => StatusCode::BAD_REQUEST,
                Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                Self::Persistence { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Self::NotFound { .. } => StatusCode::NOT_FOUND,
                Self::Store(e) => match e.kind {
                    StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
                    StoreErrorKind::ConstraintViolation => StatusCode::CONFLICT,
                    StoreErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
                    StoreErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    StoreErrorKind::ConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
            }
        }

        fn error_code(&self) -> String {
            match self {
                Self::Validation(_) => "VALIDATION_ERROR".to_string(),
                Self::Configuration(_) => "CONFIG_ERROR".to_string(),
                Self::Persistence { .. } => "PERSISTENCE_ERROR".to_string(),
                Self::NotFound { .. } => "NOT_FOUND".to_string(),
                Self::Store(e) => format!("STORE_{}", e.kind.to_string().to_uppercase()),
            }
        }
    }

    impl IntoResponse for Error {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let code = self.error_code();

            if status.is_server_error() {
                tracing::error!(code = %code, "API error: {}", self);
            } else {
                tracing::warn!(code = %code, "API error: {}", self);
            }

            // Store internals are not exposed to clients
            let message = match &self {
                Self::Store(_) | Self::Configuration(_) => "Internal error".to_string(),
                other => other.to_string(),
            };
            let violations = match self {
                Self::Persistence { violations, .. } => violations,
                _ => Vec::new(),
            };

            let body = ErrorResponse {
                error: message,
                code,
                status: status.as_u16(),
                violations,
            };
            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreErrorKind, StoreOperation};

    #[test]
    fn test_validation_display() {
        let error = Error::validation("page must be a positive integer");
        assert!(error.is_validation());
        assert_eq!(
            error.to_string(),
            "Validation error: page must be a positive integer"
        );
    }

    #[test]
    fn test_persistence_display_joins_violations() {
        let error = Error::persistence(
            "users",
            vec![
                FieldViolation::new("name", "can't be blank"),
                FieldViolation::new("age", "is invalid"),
            ],
        );
        assert_eq!(
            error.to_string(),
            "Persistence error on users: name can't be blank, age is invalid"
        );
    }

    #[test]
    fn test_not_found_display() {
        let error = Error::not_found("users", "42");
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Not found: users 42");
    }

    #[test]
    fn test_from_write_promotes_rejections() {
        let rejected = StoreError::validation_failed(
            StoreOperation::Insert,
            vec![FieldViolation::new("email", "can't be blank")],
        );
        let error = Error::from_write("users", rejected);
        match error {
            Error::Persistence { entity, violations } => {
                assert_eq!(entity, "users");
                assert_eq!(violations[0].field, "email");
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_write_uses_message_when_no_violations() {
        let rejected =
            StoreError::constraint_violation(StoreOperation::Update, "duplicate key value");
        let error = Error::from_write("users", rejected);
        match error {
            Error::Persistence { violations, .. } => {
                assert_eq!(violations, vec![FieldViolation::new("base", "duplicate key value")]);
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_write_passes_other_errors_through() {
        let failure = StoreError::connection_failed(StoreOperation::Insert, "connection reset");
        let error = Error::from_write("users", failure);
        match error {
            Error::Store(e) => assert_eq!(e.kind, StoreErrorKind::ConnectionFailed),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: Error = StoreError::timeout(StoreOperation::Count, "timed out").into();
        assert_eq!(
            error.to_string(),
            "Store timeout error during count: timed out"
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_status_codes() {
        use axum::http::StatusCode;

        assert_eq!(Error::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::not_found("users", "1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::persistence("users", vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::configuration("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Store(StoreError::timeout(StoreOperation::Fetch, "slow")).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
