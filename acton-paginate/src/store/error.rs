//! Store error types
//!
//! Structured errors reported by [`Store`](super::Store) implementations,
//! carrying the operation that failed and a category callers can match on.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::store::{StoreError, StoreErrorKind, StoreOperation};
//!
//! let error = StoreError::timeout(StoreOperation::Count, "statement timeout");
//! assert!(matches!(error.kind, StoreErrorKind::Timeout));
//! assert!(error.is_retriable());
//! ```

use std::fmt;

use crate::error::FieldViolation;

/// Store call being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Counting rows matching a query
    Count,
    /// Fetching rows matching a query
    Fetch,
    /// Fetching at most one row
    FetchOne,
    /// Inserting a record
    Insert,
    /// Updating a record
    Update,
    /// Physically removing a record
    Remove,
    /// Establishing a connection to the backend
    Connect,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Fetch => write!(f, "fetch"),
            Self::FetchOne => write!(f, "fetch_one"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
            Self::Connect => write!(f, "connect"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Record to update or remove does not exist
    NotFound,
    /// Database constraint violation (unique, foreign key, not null, check)
    ConstraintViolation,
    /// Record failed the store's own schema validation
    ValidationFailed,
    /// Failed to reach the backend
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// Row could not be encoded or decoded
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The entity (table) involved, when known
    pub entity: Option<String>,
    /// Field-level detail for validation failures
    pub violations: Vec<FieldViolation>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(
        operation: StoreOperation,
        kind: StoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity: None,
            violations: Vec::new(),
        }
    }

    /// Create a "not found" error for a write against a missing record
    pub fn not_found(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::NotFound, message)
    }

    /// Create a validation failure carrying field-level detail
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_paginate::error::FieldViolation;
    /// use acton_paginate::store::{StoreError, StoreOperation};
    ///
    /// let error = StoreError::validation_failed(
    ///     StoreOperation::Insert,
    ///     vec![FieldViolation::new("name", "can't be blank")],
    /// );
    /// assert!(error.is_rejection());
    /// ```
    pub fn validation_failed(operation: StoreOperation, violations: Vec<FieldViolation>) -> Self {
        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            operation,
            kind: StoreErrorKind::ValidationFailed,
            message,
            entity: None,
            violations,
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConstraintViolation, message)
    }

    /// Create a connection failed error
    pub fn connection_failed(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConnectionFailed, message)
    }

    /// Create a timeout error
    pub fn timeout(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Timeout, message)
    }

    /// Create a database error
    pub fn database_error(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::SerializationError, message)
    }

    /// Attach the entity involved
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: StoreOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient and the call may succeed on retry
    ///
    /// The engine itself never retries; this is for callers.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout
        )
    }

    /// Whether the store refused a write on schema-level grounds
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ValidationFailed | StoreErrorKind::ConstraintViolation
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity) = self.entity {
            write!(f, " [{}]", entity)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_operation_display() {
        assert_eq!(format!("{}", StoreOperation::Count), "count");
        assert_eq!(format!("{}", StoreOperation::Fetch), "fetch");
        assert_eq!(format!("{}", StoreOperation::FetchOne), "fetch_one");
        assert_eq!(format!("{}", StoreOperation::Insert), "insert");
        assert_eq!(format!("{}", StoreOperation::Update), "update");
        assert_eq!(format!("{}", StoreOperation::Remove), "remove");
        assert_eq!(format!("{}", StoreOperation::Connect), "connect");
    }

    #[test]
    fn test_store_error_kind_display() {
        assert_eq!(format!("{}", StoreErrorKind::NotFound), "not_found");
        assert_eq!(
            format!("{}", StoreErrorKind::ConstraintViolation),
            "constraint_violation"
        );
        assert_eq!(
            format!("{}", StoreErrorKind::ValidationFailed),
            "validation_failed"
        );
        assert_eq!(format!("{}", StoreErrorKind::Timeout), "timeout");
        assert_eq!(format!("{}", StoreErrorKind::Other), "other");
    }

    #[test]
    fn test_validation_failed_builds_message() {
        let error = StoreError::validation_failed(
            StoreOperation::Insert,
            vec![
                FieldViolation::new("name", "can't be blank"),
                FieldViolation::new("email", "has already been taken"),
            ],
        );
        assert_eq!(error.kind, StoreErrorKind::ValidationFailed);
        assert_eq!(
            error.message,
            "name can't be blank, email has already been taken"
        );
        assert_eq!(error.violations.len(), 2);
    }

    #[test]
    fn test_rejection_and_retriable_are_disjoint() {
        let rejection = StoreError::constraint_violation(StoreOperation::Insert, "unique");
        assert!(rejection.is_rejection());
        assert!(!rejection.is_retriable());

        let transient = StoreError::connection_failed(StoreOperation::Fetch, "reset");
        assert!(transient.is_retriable());
        assert!(!transient.is_rejection());

        let other = StoreError::database_error(StoreOperation::Count, "syntax");
        assert!(!other.is_retriable());
        assert!(!other.is_rejection());
    }

    #[test]
    fn test_display_with_entity() {
        let error = StoreError::not_found(StoreOperation::Update, "no row with id 7")
            .with_entity("users");
        assert_eq!(
            error.to_string(),
            "Store not_found error during update: no row with id 7 [users]"
        );
    }

    #[test]
    fn test_with_operation() {
        let error = StoreError::timeout(StoreOperation::Count, "slow")
            .with_operation(StoreOperation::Fetch);
        assert_eq!(error.operation, StoreOperation::Fetch);
    }
}
