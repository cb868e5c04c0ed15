//! Authentication Handlers
//!
//! Thin HTTP wrappers around the session manager.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use wordcard_auth::{AuthError, RequestContext};

use crate::dto::{
    LoginRequest, MessageResponse, RefreshTokenForm, RefreshTokenResponse, RegisterRequest,
    RegisterResponse, TokenResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AppForm, AppJson};
use crate::state::AppState;

/// User registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let tokens = state
        .auth
        .sessions
        .register(&request.username, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            tokens: tokens.into(),
        }),
    ))
}

/// User login
///
/// Depending on configuration, an unknown username signs up.
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let outcome = state
        .auth
        .sessions
        .login(&request.username, &request.password, &request.email)
        .await?;

    Ok(Json(outcome.tokens.into()))
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    AppForm(form): AppForm<RefreshTokenForm>,
) -> ApiResult<Json<RefreshTokenResponse>> {
    let token = state.auth.sessions.refresh_access_token(&form.refresh_token).await?;

    Ok(Json(token.into()))
}

/// Logout (requires auth)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<MessageResponse>> {
    let username = ctx.username().ok_or(AuthError::Unauthenticated)?;

    state.auth.sessions.logout(username).await?;

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}
