//! Database Error Types
//!
//! This module defines error types for database operations, providing
//! clear error handling for connection, initialization, and query failures.

use crate::models::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Covers connection, initialization, statement execution and row decoding.
/// Business-rule rejections are reported separately through [`StoreError`].
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A stored value could not be converted into its model type
    #[error("Failed to decode row: {context}")]
    RowDecodeError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decode error with context
    pub fn row_decode(context: impl Into<String>) -> Self {
        Self::RowDecodeError {
            context: context.into(),
        }
    }
}

/// Errors returned by the stores
///
/// A write either violates a tree or leaf rule (`Rejected`) or fails in the
/// database itself.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        Self::Database(DatabaseError::LibsqlError(err))
    }
}
