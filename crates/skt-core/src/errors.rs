//! Cross-cutting error types for SkillTrack.
//!
//! This module defines errors that can originate from any crate in the system.
//! Storage errors (`DatabaseError`) and HTTP errors (`ApiError`) are defined in
//! their respective crates and convert from `CoreError` where needed.

use thiserror::Error;

/// Errors that can be raised by any SkillTrack crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("{entity_type} not found")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (schema, format, constraints).
    ///
    /// The message is shown to API clients verbatim.
    #[error("{0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
