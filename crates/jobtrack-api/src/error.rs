//! API error types.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use jobtrack_models::ModelError;
use jobtrack_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned when a unique email is already taken.
pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "Duplicate value entered for email field, please choose another value";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::InvalidInput(msg) => Self::BadRequest(msg),
            StoreError::EmailTaken(_) => Self::BadRequest(DUPLICATE_EMAIL_MESSAGE.to_string()),
            StoreError::AlreadyExists(_) => Self::Conflict("The record already exists".to_string()),
            StoreError::PreconditionFailed(_) => {
                Self::Conflict("The record was changed by another request, please retry".to_string())
            }
            other => Self::Store(other),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self::BadRequest(err.to_string())
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

/// Error body: `{"msg": "..."}`.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub msg: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let msg = match &self {
            ApiError::Internal(_) | ApiError::Store(_) => {
                error!(error = %self, "Request failed");
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "Something went wrong, try again later".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::new(msg))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let not_found: ApiError = StoreError::not_found("No job was found with id x.").into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "No job was found with id x.");

        let duplicate: ApiError = StoreError::EmailTaken("a@x.com".into()).into();
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.to_string(), DUPLICATE_EMAIL_MESSAGE);

        // Only the email index reports a duplicate email
        let existing: ApiError = StoreError::AlreadyExists("jobs/abc".into()).into();
        assert_eq!(existing.status_code(), StatusCode::CONFLICT);
        assert_ne!(existing.to_string(), DUPLICATE_EMAIL_MESSAGE);

        let invalid: ApiError = StoreError::invalid_input("Please provide company and position.").into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let race: ApiError = StoreError::PreconditionFailed("stale".into()).into();
        assert_eq!(race.status_code(), StatusCode::CONFLICT);

        let server: ApiError = StoreError::ServerError(503, "unavailable".into()).into();
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_model_error_is_bad_request() {
        let err: ApiError = ModelError::validation("Please provide all values").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Please provide all values");
    }
}
