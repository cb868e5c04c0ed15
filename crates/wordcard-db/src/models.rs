//! Database models - mapped from SQLite tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Models
// ============================================================================

/// A stored account.
///
/// The password hash and the current refresh token never leave the service,
/// so both are skipped on serialization.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUser {
    /// Whether the user currently holds a live refresh token
    pub fn has_session(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Empty when the user registered without an email
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// Vocabulary Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbVocabulary {
    pub id: i64,
    pub user_id: i64,
    pub vocabulary: String,
    pub mean: String,
    pub category: String,
    pub difficulty: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by a client when creating an entry. The owner is never
/// part of this struct; repositories take it as a separate argument.
#[derive(Debug, Clone)]
pub struct NewVocabulary {
    pub vocabulary: String,
    pub mean: String,
    pub category: String,
    pub difficulty: i64,
}
