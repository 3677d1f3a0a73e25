//! API error types and their HTTP mapping.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use skt_core::errors::CoreError;
use skt_db::error::DatabaseError;
use thiserror::Error;

use crate::handlers::beneficiaries::FILE_TOO_LARGE;
use crate::response::Envelope;

/// Errors surfaced to API clients. The display string is the envelope's
/// `error` field.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input failed a validation rule.
    #[error("{0}")]
    Validation(String),

    /// Malformed request, or an operation the record's state does not allow.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The resource existed but has expired.
    #[error("{0}")]
    Gone(String),

    /// Unexpected failure. Details are logged, not returned.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(message) => Self::NotFound(message),
            DatabaseError::Validation(message) => Self::Validation(message),
            DatabaseError::InvalidState(message) => Self::BadRequest(message),
            DatabaseError::Expired(message) => Self::Gone(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::Validation(message),
            CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            CoreError::Other(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::BadRequest(FILE_TOO_LARGE.into());
        }
        Self::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(ref detail) = self {
            tracing::error!(error = %detail, "request failed");
        }
        (status, Envelope::<()>::failure(self.to_string())).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_statuses() {
        let cases = [
            (DatabaseError::NotFound("Programme not found".into()), StatusCode::NOT_FOUND),
            (DatabaseError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                DatabaseError::InvalidState("Bundle is not ready for download".into()),
                StatusCode::BAD_REQUEST,
            ),
            (DatabaseError::Expired("Bundle has expired".into()), StatusCode::GONE),
            (DatabaseError::NoResult, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(DatabaseError::Query("no such table: programmes".into()));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn validation_message_is_kept() {
        let err = ApiError::from(CoreError::validation("\"name\" is required"));
        assert_eq!(err.to_string(), "\"name\" is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
