//! Mapping of social errors onto HTTP responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use social_core::SocialError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `already_exists`
    pub error: &'static str,
    /// Human-readable description
    pub message: String,
}

/// A [`SocialError`] on its way out as a response
#[derive(Debug)]
pub struct ApiError(pub SocialError);

impl From<SocialError> for ApiError {
    fn from(err: SocialError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(SocialError::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    /// HTTP status for the wrapped error
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SocialError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SocialError::ContentTooLong { .. } => StatusCode::BAD_REQUEST,
            SocialError::AlreadyExists(_) => StatusCode::CONFLICT,
            SocialError::AlreadyFollowing(_) => StatusCode::CONFLICT,
            SocialError::Unauthorized => StatusCode::UNAUTHORIZED,
            SocialError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SocialError::NotFound(_) => StatusCode::NOT_FOUND,
            SocialError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self.0 {
            SocialError::Persistence(e) => {
                tracing::error!(error = %e, "Request failed in the store");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.0.kind(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for route handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
