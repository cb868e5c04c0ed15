//! Session Manager
//!
//! Orchestrates registration, login, logout and access-token refresh on top
//! of the password service, the token service and a [`CredentialStore`].
//!
//! Each user has at most one live refresh token: the one currently stored.
//! Every login overwrites it, so two concurrent logins for the same user race
//! and the last write wins; the loser's refresh token stops working. No
//! locking is done here beyond the store's per-row atomicity.

use std::sync::Arc;

use tracing::{debug, info, warn};
use wordcard_db::{CredentialStore, DbUser, NewUser};
use zeroize::Zeroizing;

use crate::config::SessionConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;
use crate::password::PasswordService;
use crate::types::{AccessToken, LoginOutcome, TokenKind, TokenPair};

/// Session manager for user sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    tokens: JwtService,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        tokens: JwtService,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            passwords,
            tokens,
            config,
        }
    }

    /// Register a new account and open its first session.
    ///
    /// User creation and the refresh-token write are two separate store
    /// operations. If the second fails the account exists without a session
    /// and the next login repairs it.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<TokenPair> {
        let user = self.create_account(username, email, password).await?;
        let tokens = self.open_session(&user).await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(tokens)
    }

    /// Authenticate and open a fresh session.
    ///
    /// An unknown username either creates the account from the supplied
    /// credentials (no password comparison) or is rejected exactly like a
    /// wrong password, depending on `allow_implicit_registration`. `email`
    /// is only used on the creation path.
    pub async fn login(&self, username: &str, password: &str, email: &str) -> AuthResult<LoginOutcome> {
        check_required(username, password)?;

        let (user, registered) = match self.store.find_by_username(username).await? {
            Some(user) => {
                if !self.verify_password(password, &user.password_hash).await? {
                    warn!(username = %username, "Login failed: wrong password");
                    return Err(AuthError::InvalidCredentials);
                }
                (user, false)
            }
            None if self.config.allow_implicit_registration => {
                info!(username = %username, "Unknown username at login, creating account");
                (self.create_account(username, email, password).await?, true)
            }
            None => {
                warn!(username = %username, "Login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let tokens = self.open_session(&user).await?;

        info!(user_id = user.id, username = %user.username, registered, "User logged in");
        Ok(LoginOutcome { tokens, registered })
    }

    /// Clear the stored refresh token. Unknown usernames are not an error.
    pub async fn logout(&self, username: &str) -> AuthResult<()> {
        let cleared = self.store.clear_refresh_token_by_username(username).await?;

        if cleared == 0 {
            debug!(username = %username, "Logout for unknown username");
        } else {
            info!(username = %username, "User logged out");
        }
        Ok(())
    }

    /// Exchange a stored refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated. With
    /// `validate_refresh_claims` the token must also pass signature, expiry,
    /// type and subject checks; otherwise matching the stored value is
    /// enough.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .store
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if self.config.validate_refresh_claims {
            self.check_refresh_claims(refresh_token, &user)?;
        }

        let token = self.tokens.issue_access(&user.username)?;

        info!(user_id = user.id, username = %user.username, "Access token refreshed");
        Ok(token)
    }

    fn check_refresh_claims(&self, refresh_token: &str, user: &DbUser) -> AuthResult<()> {
        let claims = self.tokens.validate(refresh_token).map_err(|e| {
            debug!(user_id = user.id, reason = e.error_code(), "Stored refresh token failed validation");
            AuthError::InvalidRefreshToken
        })?;

        if claims.kind() != TokenKind::Refresh || claims.subject() != Some(user.username.as_str()) {
            debug!(user_id = user.id, "Stored refresh token has unexpected claims");
            return Err(AuthError::InvalidRefreshToken);
        }

        Ok(())
    }

    async fn create_account(&self, username: &str, email: &str, password: &str) -> AuthResult<DbUser> {
        check_required(username, password)?;

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        // Empty email is exempt from uniqueness
        if !email.is_empty() && self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        self.passwords.check_length(password)?;
        let password_hash = self.hash_password(password).await?;

        let user = self
            .store
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        Ok(user)
    }

    /// Argon2 runs on the blocking pool so a login never stalls other requests
    async fn hash_password(&self, password: &str) -> AuthResult<String> {
        let passwords = self.passwords.clone();
        let password = Zeroizing::new(password.to_string());

        tokio::task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let passwords = self.passwords.clone();
        let password = Zeroizing::new(password.to_string());
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || passwords.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
    }

    /// Issue a pair and make its refresh token the user's only valid one
    async fn open_session(&self, user: &DbUser) -> AuthResult<TokenPair> {
        let tokens = self.tokens.issue_pair(&user.username)?;

        self.store
            .set_refresh_token(user.id, Some(tokens.refresh_token.as_str()))
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "Failed to store refresh token");
                AuthError::Database(e.to_string())
            })?;

        Ok(tokens)
    }
}

fn check_required(username: &str, password: &str) -> AuthResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingField);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, PasswordConfig};
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use wordcard_db::{Database, DbError, DbResult, UserRepo};

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.jwt.secret = "test_secret_key_that_is_at_least_32_bytes_long".to_string();
        config.password = PasswordConfig {
            memory_cost: 4096,
            time_cost: 1,
            ..PasswordConfig::default()
        };
        config
    }

    fn manager_with(store: Arc<dyn CredentialStore>, config: AuthConfig) -> SessionManager {
        SessionManager::new(
            store,
            PasswordService::new(config.password.clone()),
            JwtService::new(config.jwt.clone()),
            config.session,
        )
    }

    async fn setup() -> (SessionManager, UserRepo) {
        let db = Database::in_memory().await.unwrap();
        let repo = db.user_repo();
        (manager_with(Arc::new(repo.clone()), test_config()), repo)
    }

    /// Store that is always down
    struct UnavailableStore;

    #[async_trait]
    impl CredentialStore for UnavailableStore {
        async fn find_by_username(&self, _: &str) -> DbResult<Option<DbUser>> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
        async fn find_by_email(&self, _: &str) -> DbResult<Option<DbUser>> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
        async fn find_by_refresh_token(&self, _: &str) -> DbResult<Option<DbUser>> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
        async fn create(&self, _: &NewUser) -> DbResult<DbUser> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
        async fn set_refresh_token(&self, _: i64, _: Option<&str>) -> DbResult<()> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
        async fn clear_refresh_token_by_username(&self, _: &str) -> DbResult<u64> {
            Err(DbError::Connection("store unavailable".to_string()))
        }
    }

    /// Real store whose refresh-token writes fail
    struct ReadOnlyTokens(UserRepo);

    #[async_trait]
    impl CredentialStore for ReadOnlyTokens {
        async fn find_by_username(&self, username: &str) -> DbResult<Option<DbUser>> {
            self.0.find_by_username(username).await
        }
        async fn find_by_email(&self, email: &str) -> DbResult<Option<DbUser>> {
            self.0.find_by_email(email).await
        }
        async fn find_by_refresh_token(&self, token: &str) -> DbResult<Option<DbUser>> {
            self.0.find_by_refresh_token(token).await
        }
        async fn create(&self, user: &NewUser) -> DbResult<DbUser> {
            self.0.create(user).await
        }
        async fn set_refresh_token(&self, _: i64, _: Option<&str>) -> DbResult<()> {
            Err(DbError::Connection("write failed".to_string()))
        }
        async fn clear_refresh_token_by_username(&self, username: &str) -> DbResult<u64> {
            self.0.clear_refresh_token_by_username(username).await
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (sessions, repo) = setup().await;

        let registered = sessions.register("alice", "a@x.com", "p1").await.unwrap();
        assert!(!registered.access_token.is_empty());
        assert_eq!(registered.token_type, "Bearer");
        assert_eq!(registered.expires_in, 900);

        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(registered.refresh_token.as_str()));
        assert_ne!(stored.password_hash, "p1");

        let outcome = sessions.login("alice", "p1", "").await.unwrap();
        assert!(!outcome.registered);

        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(outcome.tokens.refresh_token.as_str()));
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let (sessions, _) = setup().await;

        assert!(matches!(sessions.register("", "", "p1").await, Err(AuthError::MissingField)));
        assert!(matches!(sessions.register("alice", "", "").await, Err(AuthError::MissingField)));
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let (sessions, _) = setup().await;
        sessions.register("alice", "a@x.com", "p1").await.unwrap();

        let err = sessions.register("alice", "other@x.com", "p2").await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));

        let err = sessions.register("bob", "a@x.com", "p2").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_conflicts_win_over_password_length() {
        let (sessions, _) = setup().await;
        sessions.register("alice", "a@x.com", "p1").await.unwrap();
        let long = "x".repeat(2000);

        let err = sessions.register("alice", "", &long).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = sessions.register("bob", "a@x.com", &long).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));

        let err = sessions.register("bob", "", &long).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooLong));
    }

    #[tokio::test]
    async fn test_empty_email_never_conflicts() {
        let (sessions, _) = setup().await;

        sessions.register("alice", "", "p1").await.unwrap();
        sessions.register("bob", "", "p2").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (sessions, repo) = setup().await;
        let tokens = sessions.register("alice", "", "p1").await.unwrap();

        let err = sessions.login("alice", "wrong", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Failed login leaves the session alone
        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(tokens.refresh_token.as_str()));
    }

    #[tokio::test]
    async fn test_login_overlong_password_is_a_mismatch() {
        let (sessions, _) = setup().await;
        sessions.register("alice", "", "p1").await.unwrap();

        let err = sessions.login("alice", &"x".repeat(2000), "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.status_code(), 401);

        // Creating an account still enforces the cap
        let err = sessions.login("carol", &"x".repeat(2000), "").await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooLong));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_logins_last_write_wins() {
        let (sessions, repo) = setup().await;
        sessions.register("alice", "", "p1").await.unwrap();

        let (a, b) = tokio::join!(
            sessions.login("alice", "p1", ""),
            sessions.login("alice", "p1", "")
        );
        let (a, b) = (a.unwrap().tokens, b.unwrap().tokens);

        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        let stored = stored.refresh_token.unwrap();
        assert!(stored == a.refresh_token || stored == b.refresh_token);

        let loser = if stored == a.refresh_token { &b } else { &a };
        assert!(matches!(
            sessions.refresh_access_token(&loser.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(sessions.refresh_access_token(&stored).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_user_registers() {
        let (sessions, repo) = setup().await;

        let outcome = sessions.login("carol", "secret", "c@x.com").await.unwrap();
        assert!(outcome.registered);

        let stored = repo.find_by_username("carol").await.unwrap().unwrap();
        assert_eq!(stored.email, "c@x.com");
        let passwords = PasswordService::new(test_config().password);
        assert!(passwords.verify_password("secret", &stored.password_hash).unwrap());

        // Second login takes the normal path
        let outcome = sessions.login("carol", "secret", "").await.unwrap();
        assert!(!outcome.registered);
    }

    #[tokio::test]
    async fn test_login_unknown_user_rejected_without_implicit_registration() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.user_repo();
        let mut config = test_config();
        config.session.allow_implicit_registration = false;
        let sessions = manager_with(Arc::new(repo.clone()), config);

        let err = sessions.login("carol", "secret", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(repo.find_by_username("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let (sessions, _) = setup().await;
        assert!(matches!(sessions.login("", "p1", "").await, Err(AuthError::MissingField)));
        assert!(matches!(sessions.login("alice", "", "").await, Err(AuthError::MissingField)));
    }

    #[tokio::test]
    async fn test_login_invalidates_previous_refresh_token() {
        let (sessions, _) = setup().await;

        let first = sessions.register("alice", "", "p1").await.unwrap();
        let second = sessions.login("alice", "p1", "").await.unwrap().tokens;

        let err = sessions.refresh_access_token(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
        assert!(sessions.refresh_access_token(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_returns_token_for_owner() {
        let (sessions, _) = setup().await;
        let tokens = sessions.register("alice", "", "p1").await.unwrap();

        let access = sessions.refresh_access_token(&tokens.refresh_token).await.unwrap();
        assert_eq!(access.token_type, "Bearer");

        let claims = JwtService::new(test_config().jwt).validate(&access.access_token).unwrap();
        assert_eq!(claims.subject(), Some("alice"));
        assert_eq!(claims.kind(), TokenKind::Access);
    }

    #[tokio::test]
    async fn test_refresh_unknown_or_empty_token() {
        let (sessions, _) = setup().await;
        sessions.register("alice", "", "p1").await.unwrap();
        sessions.logout("alice").await.unwrap();

        assert!(matches!(
            sessions.refresh_access_token("").await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(
            sessions.refresh_access_token("no-such-token").await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_after_logout_fails() {
        let (sessions, _) = setup().await;
        let tokens = sessions.register("alice", "", "p1").await.unwrap();

        sessions.logout("alice").await.unwrap();

        assert!(matches!(
            sessions.refresh_access_token(&tokens.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_stored_refresh_token() {
        let config = test_config();
        let db = Database::in_memory().await.unwrap();
        let repo = db.user_repo();
        let jwt = JwtService::new(config.jwt.clone());

        let user = repo
            .create(&NewUser {
                username: "alice".to_string(),
                email: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let expired = jwt
            .issue_at(TokenKind::Refresh, "alice", Utc::now() - Duration::days(8))
            .unwrap();
        repo.set_refresh_token(user.id, Some(expired.as_str())).await.unwrap();

        let strict = manager_with(Arc::new(repo.clone()), config.clone());
        assert!(matches!(
            strict.refresh_access_token(&expired).await,
            Err(AuthError::InvalidRefreshToken)
        ));

        // Equality-only mode honors whatever is stored
        let mut lenient_config = config;
        lenient_config.session.validate_refresh_claims = false;
        let lenient = manager_with(Arc::new(repo), lenient_config);
        assert!(lenient.refresh_access_token(&expired).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let config = test_config();
        let db = Database::in_memory().await.unwrap();
        let repo = db.user_repo();
        let jwt = JwtService::new(config.jwt.clone());

        let user = repo
            .create(&NewUser {
                username: "alice".to_string(),
                email: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let access = jwt.issue(TokenKind::Access, "alice").unwrap();
        repo.set_refresh_token(user.id, Some(access.as_str())).await.unwrap();

        let sessions = manager_with(Arc::new(repo), config);
        assert!(matches!(
            sessions.refresh_access_token(&access).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_logout_unknown_user_is_ok() {
        let (sessions, _) = setup().await;
        assert!(sessions.logout("nobody").await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (sessions, repo) = setup().await;
        sessions.register("alice", "", "p1").await.unwrap();

        sessions.logout("alice").await.unwrap();
        sessions.logout("alice").await.unwrap();

        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_store_failures_surface_as_persistence_errors() {
        let sessions = manager_with(Arc::new(UnavailableStore), test_config());

        let err = sessions.login("alice", "p1", "").await.unwrap_err();
        assert!(matches!(err, AuthError::Database(_)));
        assert_eq!(err.status_code(), 500);

        let err = sessions.logout("alice").await.unwrap_err();
        assert!(matches!(err, AuthError::Database(_)));

        let err = sessions.refresh_access_token("token").await.unwrap_err();
        assert!(matches!(err, AuthError::Database(_)));
    }

    #[tokio::test]
    async fn test_register_reports_failed_token_write() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.user_repo();
        let sessions = manager_with(Arc::new(ReadOnlyTokens(repo.clone())), test_config());

        let err = sessions.register("alice", "", "p1").await.unwrap_err();
        assert!(matches!(err, AuthError::Database(_)));

        // The account exists without a session
        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert!(stored.refresh_token.is_none());

        let err = sessions.login("alice", "p1", "").await.unwrap_err();
        assert!(matches!(err, AuthError::Database(_)));
    }
}
