//! Mapping of domain failures onto HTTP responses.

use auth::AuthError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use query::QueryError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Email could not be sent")]
    Delivery,

    /// Detail is logged, never returned.
    #[error("Server Error")]
    Internal(String),
}

impl ApiError {
    /// The uniform authentication failure.
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(NOT_AUTHORIZED.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Delivery | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(%detail, "internal server error");
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { fields, .. } => {
                ApiError::Conflict(format!("Duplicate field value entered for {fields}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Storage(inner) => inner.into(),
            validation => ApiError::Validation(validation.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".to_string()),
            AuthError::InvalidToken => ApiError::unauthorized(),
            AuthError::InvalidResetToken => ApiError::Validation("Invalid token".to_string()),
            AuthError::Validation(message) => ApiError::Validation(message),
            err @ (AuthError::UserNotFound | AuthError::UnknownEmail) => ApiError::NotFound(err.to_string()),
            err @ AuthError::DuplicateEmail => ApiError::Conflict(err.to_string()),
            AuthError::DeliveryFailed(_) => ApiError::Delivery,
            AuthError::Storage(inner) => inner.into(),
            internal @ (AuthError::HashingError(_)
            | AuthError::VerificationError
            | AuthError::TokenGenerationError(_)) => ApiError::Internal(internal.to_string()),
        }
    }
}
