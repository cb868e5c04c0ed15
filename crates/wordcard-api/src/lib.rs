//! wordcard REST API
//!
//! HTTP surface of the wordcard service.
//!
//! # API Structure
//!
//! ```text
//! /health                      - Liveness + database ping
//! /api/
//! ├── /auth/register           - Create account, returns token pair
//! ├── /auth/login              - Authenticate (or sign up), returns token pair
//! ├── /auth/refresh            - Exchange refresh token (form field) for access token
//! ├── /auth/logout             - Clear the caller's refresh token        [auth]
//! └── /vocabulary              - Caller's vocabulary entries             [auth]
//!     ├── /hard                - Difficulty 5, at most 20
//!     └── /:id                 - One entry, owner only
//! ```
//!
//! Routes marked `[auth]` sit behind the auth gate and need
//! `Authorization: Bearer <access token>`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Enable CORS for browser clients
    pub enable_cors: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            enable_tracing: true,
        }
    }
}

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let mut router = create_test_router(state);

    // Add tracing
    if config.enable_tracing {
        router = router.layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        );
    }

    // Request IDs wrap tracing so spans see the generated id
    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // Add CORS
    if config.enable_cors {
        router = router.layer(cors_layer(&config.cors_origins));
    }

    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
}

/// Create a router without the outer HTTP layers
pub fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(&state))
        .route("/health", axum::routing::get(handlers::health::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.enable_cors);
        assert!(config.enable_tracing);
        assert!(config.cors_origins.contains(&"http://localhost:5173".to_string()));
    }
}
