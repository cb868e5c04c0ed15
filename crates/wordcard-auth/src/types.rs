//! Core authentication types
//!
//! Shared types used across the token service, the session manager and the
//! auth gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Token Types
// =============================================================================

/// The two token kinds issued by the token service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived, authorizes individual requests
    Access,
    /// Long-lived, only exchanged for a new access token
    Refresh,
}

impl TokenKind {
    /// Value of the `token_type` claim, if the kind carries one.
    ///
    /// Access tokens have no discriminator.
    pub fn claim(&self) -> Option<&'static str> {
        match self {
            Self::Access => None,
            Self::Refresh => Some("refresh"),
        }
    }
}

/// JWT claims structure
///
/// `sub` is kept as a raw JSON value so that a token with a missing or
/// non-string subject still decodes and can be rejected by the gate with a
/// precise reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    #[serde(default)]
    pub sub: serde_json::Value,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// JWT ID, makes two tokens minted in the same second distinct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// `"refresh"` on refresh tokens, absent on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenClaims {
    /// Subject as a string, `None` if absent or not a string
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_str()
    }

    pub fn kind(&self) -> TokenKind {
        match self.token_type.as_deref() {
            Some("refresh") => TokenKind::Refresh,
            _ => TokenKind::Access,
        }
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

/// JWT token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// A freshly issued access token, returned by the refresh flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl AccessToken {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

// =============================================================================
// Session Types
// =============================================================================

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Freshly issued token pair; its refresh token is now the only valid one
    pub tokens: TokenPair,
    /// Whether the account was created by this login
    pub registered: bool,
}

// =============================================================================
// Request Identity
// =============================================================================

/// Identity the auth gate attaches to an accepted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Username from the token subject
    pub username: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

/// Request-scoped context handed to handlers
///
/// `identity` is `None` on routes the gate does not protect.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(user: AuthenticatedUser) -> Self {
        Self {
            identity: Some(user),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|user| user.username.as_str())
    }
}
