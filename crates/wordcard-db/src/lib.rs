//! wordcard Database Layer
//!
//! SQLite persistence for the wordcard service.
//!
//! # Repository Pattern
//!
//! - [`UserRepo`]: accounts and their current refresh token. Implements
//!   [`CredentialStore`], the seam the authentication layer depends on.
//! - [`VocabularyRepo`]: vocabulary entries, every query scoped by owner id.
//!
//! Single-record writes rely on SQLite's own atomicity. Nothing here takes
//! application-level locks.

pub mod config;
pub mod error;
pub mod models;
pub mod repos;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to SQLite: {}", config.url_masked());

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::Connection(format!("Invalid database URL: {}", e)))?
            .create_if_missing(config.create_if_missing)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(format!("SQLite: {}", e)))?;

        info!("Connected to SQLite");

        Ok(Self { pool })
    }

    /// Open a private in-memory database with migrations applied.
    ///
    /// Every connection to `sqlite::memory:` sees its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connection(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(format!("SQLite: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> HealthStatus {
        let sqlite = sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok();

        HealthStatus {
            sqlite,
            healthy: sqlite,
        }
    }

    /// Create repository instances
    pub fn user_repo(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    pub fn vocabulary_repo(&self) -> VocabularyRepo {
        VocabularyRepo::new(self.pool.clone())
    }
}

/// Health status of the database connection
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub sqlite: bool,
    pub healthy: bool,
}
