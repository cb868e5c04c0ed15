//! API error handling
//!
//! Every error leaves the service as `{"error": <message>, "code": <CODE>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use wordcard_auth::{AuthError, ErrorResponse};
use wordcard_db::DbError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error raised by the authentication layer
    #[error(transparent)]
    Auth(#[from] AuthError),

    // =========================================================================
    // Request Errors
    // =========================================================================
    /// Body could not be parsed
    #[error("Invalid request payload")]
    InvalidPayload,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid ID")]
    InvalidId,

    // =========================================================================
    // Resource Errors
    // =========================================================================
    /// Missing, or owned by someone else
    #[error("Word not found")]
    WordNotFound,

    /// The token's user no longer exists
    #[error("User not found")]
    AccountGone,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::InvalidPayload | Self::Validation(_) | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::AccountGone => StatusCode::UNAUTHORIZED,
            Self::WordNotFound => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidId => "INVALID_ID",
            Self::WordNotFound => "WORD_NOT_FOUND",
            Self::AccountGone => "USER_NOT_FOUND",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to clients
    pub fn client_message(&self) -> String {
        match self {
            Self::Auth(e) => e.client_message(),
            Self::Database(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.client_message(),
            code: err.error_code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
