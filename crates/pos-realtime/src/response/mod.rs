//! Response types and error handling for HTTP endpoints
//!
//! Every failure renders as `{error, code}` JSON with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pos_common::{AuthError, ErrorResponse};
use thiserror::Error;
use tracing::error;

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Unknown room: {0}")]
    UnknownRoom(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) if e.is_server_fault() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::UnknownRoom(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::Forbidden => "INSUFFICIENT_PERMISSIONS",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::UnknownRoom(_) => "ROOM_NOT_FOUND",
        }
    }

    /// Message safe to show the caller
    ///
    /// Credential failures only ever report their short reason.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(e) => e.reason().to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log server errors
        if status.is_server_error() {
            error!(error = ?self, "Server error occurred");
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.error_code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
