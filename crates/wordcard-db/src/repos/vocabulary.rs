//! Vocabulary repository
//!
//! Every read and write is keyed by the owning user's id.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{DbResult, DbVocabulary, NewVocabulary};

const VOCABULARY_COLUMNS: &str =
    "id, user_id, vocabulary, mean, category, difficulty, created_at, updated_at";

pub struct VocabularyRepo {
    pool: SqlitePool,
}

impl VocabularyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an entry owned by `owner_id`
    pub async fn create(&self, owner_id: i64, entry: &NewVocabulary) -> DbResult<DbVocabulary> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, DbVocabulary>(&format!(
            r#"
            INSERT INTO vocabularies (user_id, vocabulary, mean, category, difficulty, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {VOCABULARY_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&entry.vocabulary)
        .bind(&entry.mean)
        .bind(&entry.category)
        .bind(entry.difficulty)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// All entries of one owner, oldest first
    pub async fn list_by_owner(&self, owner_id: i64) -> DbResult<Vec<DbVocabulary>> {
        let entries = sqlx::query_as::<_, DbVocabulary>(&format!(
            "SELECT {VOCABULARY_COLUMNS} FROM vocabularies WHERE user_id = ?1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// One entry, only if it belongs to `owner_id`
    pub async fn find_for_owner(&self, id: i64, owner_id: i64) -> DbResult<Option<DbVocabulary>> {
        let entry = sqlx::query_as::<_, DbVocabulary>(&format!(
            "SELECT {VOCABULARY_COLUMNS} FROM vocabularies WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Entries of one owner at a given difficulty
    pub async fn list_by_difficulty(
        &self,
        owner_id: i64,
        difficulty: i64,
        limit: i64,
    ) -> DbResult<Vec<DbVocabulary>> {
        let entries = sqlx::query_as::<_, DbVocabulary>(&format!(
            r#"
            SELECT {VOCABULARY_COLUMNS} FROM vocabularies
            WHERE user_id = ?1 AND difficulty = ?2
            ORDER BY id
            LIMIT ?3
            "#
        ))
        .bind(owner_id)
        .bind(difficulty)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CredentialStore, Database, NewUser};

    async fn seed_user(db: &Database, username: &str) -> i64 {
        db.user_repo()
            .create(&NewUser {
                username: username.to_string(),
                email: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn word(text: &str, difficulty: i64) -> NewVocabulary {
        NewVocabulary {
            vocabulary: text.to_string(),
            mean: format!("meaning of {}", text),
            category: "noun".to_string(),
            difficulty,
        }
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_owner() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let repo = db.vocabulary_repo();

        let apple = repo.create(alice, &word("apple", 1)).await.unwrap();
        repo.create(alice, &word("ephemeral", 5)).await.unwrap();
        repo.create(bob, &word("banana", 2)).await.unwrap();

        let mine = repo.list_by_owner(alice).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|v| v.user_id == alice));

        assert!(repo.find_for_owner(apple.id, alice).await.unwrap().is_some());
        assert!(repo.find_for_owner(apple.id, bob).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_difficulty_respects_limit() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let repo = db.vocabulary_repo();

        for i in 0..5 {
            repo.create(alice, &word(&format!("hard{}", i), 5)).await.unwrap();
        }
        repo.create(alice, &word("easy", 1)).await.unwrap();

        let hard = repo.list_by_difficulty(alice, 5, 3).await.unwrap();
        assert_eq!(hard.len(), 3);
        assert!(hard.iter().all(|v| v.difficulty == 5));
    }
}
