//! User repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{DbError, DbResult, DbUser, NewUser};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, refresh_token, created_at, updated_at";

/// Persistence operations the authentication layer needs for credentials.
///
/// Each method is a single statement, so each is atomic on its own. Callers
/// that chain two of them (create, then set a refresh token) get no
/// transaction across the pair.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact username
    async fn find_by_username(&self, username: &str) -> DbResult<Option<DbUser>>;

    /// Find a user by exact email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<DbUser>>;

    /// Find the user whose stored refresh token equals `token`
    async fn find_by_refresh_token(&self, token: &str) -> DbResult<Option<DbUser>>;

    /// Insert a user. Fails with [`DbError::Duplicate`] naming the
    /// conflicting column (`username` or `email`).
    async fn create(&self, user: &NewUser) -> DbResult<DbUser>;

    /// Overwrite (or clear, with `None`) the refresh token of a user
    async fn set_refresh_token(&self, user_id: i64, token: Option<&str>) -> DbResult<()>;

    /// Clear the refresh token of whichever user has `username`.
    /// Returns the number of rows touched, 0 for an unknown username.
    async fn clear_refresh_token_by_username(&self, username: &str) -> DbResult<u64>;
}

/// User repository for authentication and profile management
#[derive(Clone)]
pub struct UserRepo {
    pool: SqlitePool,
}

impl UserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_one(&self, column: &'static str, value: &str) -> DbResult<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for UserRepo {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<DbUser>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<DbUser>> {
        if email.is_empty() {
            return Ok(None);
        }
        self.find_one("email", email).await
    }

    async fn find_by_refresh_token(&self, token: &str) -> DbResult<Option<DbUser>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.find_one("refresh_token", token).await
    }

    async fn create(&self, user: &NewUser) -> DbResult<DbUser> {
        if user.username.is_empty() || user.password_hash.is_empty() {
            return Err(DbError::InvalidInput(
                "username and password hash are required".to_string(),
            ));
        }

        let now = Utc::now();
        let created = sqlx::query_as::<_, DbUser>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, refresh_token, created_at, updated_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(created)
    }

    async fn set_refresh_token(&self, user_id: i64, token: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(token)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User {} not found", user_id)));
        }

        Ok(())
    }

    async fn clear_refresh_token_by_username(&self, username: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, updated_at = ?1 WHERE username = ?2",
        )
        .bind(Utc::now())
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn map_unique_violation(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            // SQLite reports "UNIQUE constraint failed: users.<column>"
            let column = if db_err.message().contains("users.email") {
                "email"
            } else {
                "username"
            };
            return DbError::Duplicate(column.to_string());
        }
    }
    DbError::Query(e)
}
