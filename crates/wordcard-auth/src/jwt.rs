//! JWT Token Service
//!
//! Issues and validates HS256 access and refresh tokens from one shared
//! secret. The secret is moved in at construction and never changes.
//!
//! Validation never trusts the header's `alg`: only HS256 is accepted.
//! Expiry is checked here against an explicit clock with zero leeway so
//! callers (and tests) control what "now" means.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{AccessToken, TokenClaims, TokenKind, TokenPair};

/// JWT service for token management
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Access token lifetime in seconds, as reported in `expires_in`
    pub fn access_expires_in(&self) -> i64 {
        self.config.access_token_lifetime.as_secs() as i64
    }

    fn lifetime(&self, kind: TokenKind) -> AuthResult<Duration> {
        let lifetime = match kind {
            TokenKind::Access => self.config.access_token_lifetime,
            TokenKind::Refresh => self.config.refresh_token_lifetime,
        };
        Duration::from_std(lifetime).map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Issue a token of the given kind for `username`
    pub fn issue(&self, kind: TokenKind, username: &str) -> AuthResult<String> {
        self.issue_at(kind, username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, kind: TokenKind, username: &str, now: DateTime<Utc>) -> AuthResult<String> {
        let exp = now + self.lifetime(kind)?;

        let claims = TokenClaims {
            sub: serde_json::Value::String(username.to_string()),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
            token_type: kind.claim().map(str::to_string),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AuthError::TokenSigningFailed
        })
    }

    /// Generate a new token pair (access + refresh)
    pub fn issue_pair(&self, username: &str) -> AuthResult<TokenPair> {
        let now = Utc::now();
        let access_token = self.issue_at(TokenKind::Access, username, now)?;
        let refresh_token = self.issue_at(TokenKind::Refresh, username, now)?;

        Ok(TokenPair::new(access_token, refresh_token, self.access_expires_in()))
    }

    /// Generate a new access token only
    pub fn issue_access(&self, username: &str) -> AuthResult<AccessToken> {
        let access_token = self.issue(TokenKind::Access, username)?;
        Ok(AccessToken::new(access_token, self.access_expires_in()))
    }

    /// Validate a token against the wall clock
    pub fn validate(&self, token: &str) -> AuthResult<TokenClaims> {
        self.validate_at(token, Utc::now())
    }

    /// Validate signature, algorithm and expiry relative to `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
