use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller is not a participant of the requested match.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Caller has no active match accepting answers.
    #[error("no active match accepting answers for this user")]
    NoActiveMatch,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A write kept losing races against concurrent writers.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The catalog cannot supply enough published questions for a match.
    #[error("only {available} published questions available, {needed} needed")]
    InsufficientQuestions {
        /// Published questions currently in the catalog.
        available: usize,
        /// Questions required per match.
        needed: usize,
    },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::Conflict(message),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Access to a resource the caller does not participate in.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state; the caller should re-poll, not retry blindly.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::NoActiveMatch => {
                AppError::Conflict("no active match accepting answers".into())
            }
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            err @ ServiceError::InsufficientQuestions { .. } => {
                AppError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
