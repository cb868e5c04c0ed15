//! Authentication Middleware for Axum
//!
//! The auth gate: a tower layer that rejects any request without a valid
//! access token before it reaches the handler, and attaches the caller's
//! identity to the request when it lets one through.
//!
//! Per request:
//! 1. `Authorization` must be `Bearer <token>` (prefix is case-sensitive)
//! 2. the token service must accept the token
//! 3. the subject must be a string, and the token must not be a refresh token
//! 4. expiry is re-checked against the same clock
//! 5. the identity is inserted into request extensions
//!
//! The gate holds no mutable state.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, StatusCode},
    response::Response,
};
use chrono::{DateTime, Utc};
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

use crate::error::{AuthError, ErrorResponse};
use crate::jwt::JwtService;
use crate::types::{AuthenticatedUser, RequestContext, TokenClaims, TokenKind};

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware layer
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<JwtService>,
}

impl AuthLayer {
    /// Create a new authentication layer
    pub fn new(tokens: Arc<JwtService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: Arc<JwtService>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let tokens = self.tokens.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let result = authorize(req.headers().get(AUTHORIZATION), &tokens, Utc::now());
            match result {
                Ok(user) => {
                    let (mut parts, body) = req.into_parts();
                    parts.extensions.insert(user);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(e) => {
                    debug!(
                        reason = e.error_code(),
                        method = %req.method(),
                        path = %req.uri().path(),
                        "Request rejected by auth gate"
                    );
                    Ok(auth_error_response(e))
                }
            }
        })
    }
}

/// Run the gate's checks against one `Authorization` header value
pub fn authorize(
    header: Option<&HeaderValue>,
    tokens: &JwtService,
    now: DateTime<Utc>,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(header).ok_or(AuthError::MissingOrMalformedHeader)?;

    let claims = tokens
        .validate_at(token, now)
        .map_err(|_| AuthError::InvalidOrExpiredToken)?;

    identity_from_claims(&claims, now)
}

/// Token after the exact `Bearer ` prefix, if non-empty
fn bearer_token(header: Option<&HeaderValue>) -> Option<&str> {
    let value = header?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn identity_from_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<AuthenticatedUser, AuthError> {
    let username = claims.subject().ok_or(AuthError::InvalidClaims)?;

    // Refresh tokens are only good at the refresh endpoint
    if claims.kind() == TokenKind::Refresh {
        return Err(AuthError::InvalidClaims);
    }

    let expires_at = claims.expires_at().ok_or(AuthError::InvalidClaims)?;
    if claims.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }

    Ok(AuthenticatedUser {
        username: username.to_string(),
        expires_at,
    })
}

/// Create error response for authentication errors
fn auth_error_response(error: AuthError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = ErrorResponse::from(&error);

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&response).unwrap_or_default()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

// =============================================================================
// Axum Extractors
// =============================================================================

/// Typed request context; carries the identity when the gate ran
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext {
            identity: parts.extensions.get::<AuthenticatedUser>().cloned(),
        })
    }
}
