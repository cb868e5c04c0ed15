//! Vocabulary DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use wordcard_db::{DbVocabulary, NewVocabulary};

/// Default difficulty for new entries
pub const DEFAULT_DIFFICULTY: i64 = 1;

/// Create vocabulary request
///
/// Any `user_id` in the body is ignored; the owner is the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVocabularyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "vocabulary is required"))]
    pub vocabulary: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "mean is required"))]
    pub mean: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 1, max = 5, message = "difficulty must be between 1 and 5"))]
    pub difficulty: Option<i64>,
}

impl From<CreateVocabularyRequest> for NewVocabulary {
    fn from(req: CreateVocabularyRequest) -> Self {
        Self {
            vocabulary: req.vocabulary,
            mean: req.mean,
            category: req.category,
            difficulty: req.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
        }
    }
}

/// Vocabulary entry as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: i64,
    pub user_id: i64,
    pub vocabulary: String,
    pub mean: String,
    pub category: String,
    pub difficulty: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbVocabulary> for VocabularyItem {
    fn from(v: DbVocabulary) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            vocabulary: v.vocabulary,
            mean: v.mean,
            category: v.category,
            difficulty: v.difficulty,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Single entry envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyResponse {
    pub data: VocabularyItem,
}

/// Created entry envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVocabularyResponse {
    pub data: VocabularyItem,
    pub message: String,
}

/// List envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyListResponse {
    pub data: Vec<VocabularyItem>,
    pub total: usize,
}

impl From<Vec<DbVocabulary>> for VocabularyListResponse {
    fn from(entries: Vec<DbVocabulary>) -> Self {
        let data: Vec<VocabularyItem> = entries.into_iter().map(VocabularyItem::from).collect();
        Self {
            total: data.len(),
            data,
        }
    }
}
