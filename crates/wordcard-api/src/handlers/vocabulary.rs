//! Vocabulary Handlers
//!
//! All reads and writes are scoped to the caller's user id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use wordcard_db::NewVocabulary;

use crate::dto::{
    CreateVocabularyRequest, CreateVocabularyResponse, VocabularyListResponse, VocabularyResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::state::AppState;

const HARD_DIFFICULTY: i64 = 5;
const HARD_LIST_LIMIT: i64 = 20;

/// Create an entry owned by the caller
pub async fn create_vocabulary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateVocabularyRequest>,
) -> ApiResult<(StatusCode, Json<CreateVocabularyResponse>)> {
    let entry = NewVocabulary::from(request);
    let created = state.db.vocabulary_repo().create(user.id, &entry).await?;

    tracing::info!(user_id = user.id, vocabulary_id = created.id, "Vocabulary created");

    Ok((
        StatusCode::CREATED,
        Json(CreateVocabularyResponse {
            data: created.into(),
            message: "Vocabulary created successfully".to_string(),
        }),
    ))
}

/// List the caller's entries
pub async fn list_vocabulary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<VocabularyListResponse>> {
    let entries = state.db.vocabulary_repo().list_by_owner(user.id).await?;
    Ok(Json(entries.into()))
}

/// The caller's hardest entries
pub async fn list_hard_vocabulary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<VocabularyListResponse>> {
    let entries = state
        .db
        .vocabulary_repo()
        .list_by_difficulty(user.id, HARD_DIFFICULTY, HARD_LIST_LIMIT)
        .await?;
    Ok(Json(entries.into()))
}

/// One entry; another user's entry looks the same as a missing one
pub async fn get_vocabulary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VocabularyResponse>> {
    let id: i64 = id.parse().map_err(|_| ApiError::InvalidId)?;

    let entry = state
        .db
        .vocabulary_repo()
        .find_for_owner(id, user.id)
        .await?
        .ok_or(ApiError::WordNotFound)?;

    Ok(Json(VocabularyResponse { data: entry.into() }))
}
