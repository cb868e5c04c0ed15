//! Authentication DTOs

use serde::{Deserialize, Serialize};
use wordcard_auth::{AccessToken, TokenPair};

// =============================================================================
// Requests
// =============================================================================

/// Registration request
///
/// Missing fields deserialize as empty so they are reported as missing
/// rather than as an unreadable payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Only used when the login creates the account
    #[serde(default)]
    pub email: String,
}

/// Refresh form (`application/x-www-form-urlencoded`)
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenForm {
    #[serde(default)]
    pub refresh_token: String,
}

// =============================================================================
// Responses
// =============================================================================

/// Token envelope returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime (seconds)
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type,
            expires_in: pair.expires_in,
        }
    }
}

/// Registration response: the token envelope plus a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

/// Refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AccessToken> for RefreshTokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}

/// Plain message response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
