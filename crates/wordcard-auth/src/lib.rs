//! wordcard Authentication Layer
//!
//! Authentication and per-request identity for the wordcard service:
//!
//! - **Password Hashing**: Argon2id with random salt and optional pepper
//! - **Token Service**: HS256 access tokens (15 min) and refresh tokens (7 days)
//! - **Session Manager**: register, login, logout and access-token refresh,
//!   with one live refresh token per user
//! - **Auth Gate**: tower layer guarding protected routes
//! - **Identity Resolver**: maps the gate's identity to a stored user
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Authentication Flow                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  credentials → SessionManager ──► PasswordService            │
//! │                     │       └───► CredentialStore            │
//! │                     ▼                                        │
//! │                JwtService ──► token pair                     │
//! │                                                              │
//! │  Request → AuthLayer (JwtService) → Handler                  │
//! │                                        │                     │
//! │                                        ▼                     │
//! │                     IdentityResolver ──► CredentialStore     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, ErrorKind, ErrorResponse};
pub use identity::IdentityResolver;
pub use jwt::JwtService;
pub use middleware::{authorize, AuthLayer, AuthMiddleware};
pub use password::PasswordService;
pub use session::SessionManager;
pub use types::*;

use std::sync::Arc;
use wordcard_db::{CredentialStore, Database};

/// Main authentication service combining all components
#[derive(Clone)]
pub struct AuthService {
    pub jwt: Arc<JwtService>,
    pub sessions: SessionManager,
    pub identity: IdentityResolver,
}

impl AuthService {
    /// Create a new auth service backed by the database's user table
    pub fn new(db: &Database, config: AuthConfig) -> Self {
        Self::with_store(Arc::new(db.user_repo()), config)
    }

    /// Create a new auth service on top of any credential store
    pub fn with_store(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Self {
        let jwt = JwtService::new(config.jwt.clone());
        let sessions = SessionManager::new(
            store.clone(),
            PasswordService::new(config.password),
            jwt.clone(),
            config.session,
        );
        let identity = IdentityResolver::new(store);

        Self {
            jwt: Arc::new(jwt),
            sessions,
            identity,
        }
    }

    /// Create an auth layer for Axum router
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.jwt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auth_service_creation() {
        let db = Database::in_memory().await.unwrap();
        let mut config = AuthConfig::default();
        config.jwt.secret = "test_secret_key_that_is_at_least_32_bytes_long".to_string();
        config.password.memory_cost = 4096;
        config.password.time_cost = 1;

        let auth = AuthService::new(&db, config);
        let tokens = auth.sessions.register("alice", "", "p1").await.unwrap();

        let claims = auth.jwt.validate(&tokens.access_token).unwrap();
        assert_eq!(claims.subject(), Some("alice"));

        let ctx = RequestContext::authenticated(AuthenticatedUser {
            username: "alice".to_string(),
            expires_at: chrono::Utc::now(),
        });
        assert!(auth.identity.resolve_user_id(&ctx).await.is_ok());
    }
}
