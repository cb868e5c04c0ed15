//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api`
pub fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .merge(public_auth_routes())
        .merge(protected_routes(state))
}

/// Authentication routes that issue credentials
fn public_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh_token))
}

/// Everything behind the auth gate
fn protected_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/vocabulary",
            post(handlers::vocabulary::create_vocabulary).get(handlers::vocabulary::list_vocabulary),
        )
        .route("/vocabulary/hard", get(handlers::vocabulary::list_hard_vocabulary))
        .route("/vocabulary/:id", get(handlers::vocabulary::get_vocabulary))
        .route_layer(state.auth.layer())
}
