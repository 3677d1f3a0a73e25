//! Database error types for skt-db.

use skt_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A referenced record does not exist. The message is client-facing,
    /// e.g. `"Programme not found"`.
    #[error("{0}")]
    NotFound(String),

    /// Input rejected by a business rule (duplicate code, bad date order).
    #[error("{0}")]
    Validation(String),

    /// The record exists but is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    /// The record is past its expiry.
    #[error("{0}")]
    Expired(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }
}

impl From<CoreError> for DatabaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity_type, .. } => Self::not_found(&entity_type),
            CoreError::Validation(message) => Self::Validation(message),
            CoreError::Other(e) => Self::Other(e),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.into())
    }
}
