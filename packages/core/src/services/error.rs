//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations. The HTTP
//! layer maps `NotFound` to 404, `Validation` to 400 and the rest to 500.

use crate::db::{DatabaseError, StoreError};
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found by ID
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// A business rule rejected the operation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    /// Create a validation error for an operation that is not allowed
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationError::InvalidOperation(msg.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(e) => Self::Validation(e),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}
