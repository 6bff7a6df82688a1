use auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use requests::RequestError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Every failure a handler or middleware can surface, mapped onto an HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or semantically invalid input
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed or rejected credentials
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("invalid credentials"),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid or expired token"),
            AuthError::DuplicateUsername
            | AuthError::DuplicateEmail
            | AuthError::InvalidRole(_)
            | AuthError::PasswordTooLong(_) => ApiError::Validation(err.to_string()),
            AuthError::NotFound => ApiError::NotFound(err.to_string()),
            AuthError::HashingError(_) | AuthError::TokenGenerationError(_) | AuthError::Database(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::InvalidDate { .. }
            | RequestError::InvalidKind(_)
            | RequestError::InvalidStatus(_)
            | RequestError::MissingField(_) => ApiError::Validation(err.to_string()),
            RequestError::NotFound | RequestError::RequesterNotFound => ApiError::NotFound(err.to_string()),
            RequestError::Serialization(_) | RequestError::Database(_) => ApiError::Internal(err.to_string()),
        }
    }
}
