//! Error types and result types for counter store operations.
//!
//! This module provides error handling for all counter store operations.
//! Use [`CounterStoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a counter store.
///
/// Each variant is a stable, machine-checkable error kind; the payload carries
/// the human-readable message. Lookups that merely miss are not errors — they
/// surface as `None` or a zero count instead.
#[derive(Error, Debug)]
pub enum CounterStoreError {
    /// An input record or filter failed structural checks before any I/O.
    #[error("validation error: {0}")]
    Validation(String),
    /// Required connection parameters (database, collection, or table name) are missing or empty.
    #[error("configuration error: {0}")]
    Config(String),
    /// The underlying store is unreachable or the connection string is absent.
    #[error("connection error: {0}")]
    Connection(String),
    /// An error occurred in the underlying storage backend.
    #[error("backend error: {0}")]
    Backend(String),
    /// An operation hit an unsupported code path. Always fails closed, never
    /// degrades to a wrong answer.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CounterStoreError {
    /// Returns the stable error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            CounterStoreError::Validation(_) => "E_VALIDATION",
            CounterStoreError::Config(_) => "E_CONFIG",
            CounterStoreError::Connection(_) => "E_CONNECTION",
            CounterStoreError::Backend(_) => "E_BACKEND",
            CounterStoreError::Internal(_) => "E_INTERNAL",
        }
    }
}

/// A specialized `Result` type for counter store operations.
pub type CounterStoreResult<T> = Result<T, CounterStoreError>;

impl From<SerdeJsonError> for CounterStoreError {
    fn from(err: SerdeJsonError) -> Self {
        CounterStoreError::Internal(err.to_string())
    }
}
