//! Authentication error types
//!
//! Errors are designed to be:
//! - Informative for logging/debugging
//! - Safe for external exposure (no sensitive data leakage)
//! - Convertible to HTTP status codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wordcard_db::DbError;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Broad classes of failure, each with one HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input (400)
    Validation,
    /// Duplicate username or email (400)
    Conflict,
    /// Bad password, bad token, bad refresh token (401)
    Authentication,
    /// The authenticated identity no longer exists (404 by default)
    NotFound,
    /// A store operation failed (500, never retried)
    Persistence,
    /// Hashing or signing primitive failed (500)
    Crypto,
    /// Anything else that is the server's fault (500)
    Internal,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Username or password was empty
    #[error("Username and password are required")]
    MissingField,

    /// Password exceeds the configured maximum length
    #[error("Password is too long")]
    PasswordTooLong,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// Unknown user (when implicit registration is off) or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No stored refresh token matches, or the token failed validation
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    // =========================================================================
    // Token Service Errors
    // =========================================================================
    /// Signature mismatch or a signing algorithm outside the allow-list
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Not a parseable token
    #[error("Malformed token")]
    MalformedToken,

    /// Expiry claim is in the past
    #[error("Token expired")]
    TokenExpired,

    // =========================================================================
    // Auth Gate Errors
    // =========================================================================
    #[error("Missing or invalid authorization header")]
    MissingOrMalformedHeader,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Invalid token claims")]
    InvalidClaims,

    // =========================================================================
    // Identity Errors
    // =========================================================================
    /// No identity was attached to the request
    #[error("User not authenticated")]
    Unauthenticated,

    /// The token's subject has no account (deleted after issuance)
    #[error("User not found")]
    UserNotFound,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Credential store failure
    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing failed")]
    PasswordHashingFailed,

    #[error("Token signing failed")]
    TokenSigningFailed,

    /// Internal error (should not be exposed to clients)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField | Self::PasswordTooLong => ErrorKind::Validation,

            Self::UsernameTaken | Self::EmailTaken => ErrorKind::Conflict,

            Self::InvalidCredentials
            | Self::InvalidRefreshToken
            | Self::InvalidSignature
            | Self::MalformedToken
            | Self::TokenExpired
            | Self::MissingOrMalformedHeader
            | Self::InvalidOrExpiredToken
            | Self::InvalidClaims
            | Self::Unauthenticated => ErrorKind::Authentication,

            Self::UserNotFound => ErrorKind::NotFound,

            Self::Database(_) => ErrorKind::Persistence,

            Self::PasswordHashingFailed | Self::TokenSigningFailed => ErrorKind::Crypto,

            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Persistence | ErrorKind::Crypto | ErrorKind::Internal => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField => "MISSING_FIELD",
            Self::PasswordTooLong => "PASSWORD_TOO_LONG",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingOrMalformedHeader => "MISSING_OR_MALFORMED_HEADER",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::InvalidClaims => "INVALID_CLAIMS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Database(_)
            | Self::PasswordHashingFailed
            | Self::TokenSigningFailed
            | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error response for API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message (human-readable)
    pub error: String,
    /// Error code (machine-readable)
    pub code: String,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        Self {
            error: error.client_message(),
            code: error.error_code().to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => Self::InvalidSignature,
            _ => Self::MalformedToken,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(ref column) if column == "email" => Self::EmailTaken,
            DbError::Duplicate(_) => Self::UsernameTaken,
            other => Self::Database(other.to_string()),
        }
    }
}
