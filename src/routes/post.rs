use crate::{
    AppState,
    auth::TokenRole,
    dto::CreatePostRequest,
    errors::ApiError,
    models::{Post, mask_profanity},
    repository::PostQuery,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

/// POST /api/chirps
/// Headers: Authorization: Bearer <access token>
/// Body: { "body": "..." }
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let user_id = state.tokens.authorize(&headers, TokenRole::Access).await?;

    let Json(payload) = payload.map_err(|e| ApiError::ValidationError(e.body_text()))?;
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;
    let post = state
        .repo
        .create_post(user_id, &mask_profanity(&payload.body))
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/chirps?author_id=1&sort=desc
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.repo.list_posts(query).await?))
}

/// GET /api/chirps/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.repo.get_post(id).await?))
}

/// DELETE /api/chirps/{id}
/// Headers: Authorization: Bearer <access token>
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.tokens.authorize(&headers, TokenRole::Access).await?;

    // Ownership is checked inside the store lock
    state.repo.delete_post(id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
