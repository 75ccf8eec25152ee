use crate::{
    AppState,
    auth::TokenRole,
    dto::{AuthResponse, CredentialsRequest, LoginRequest},
    errors::ApiError,
    models::User,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use bcrypt::hash;
use tracing::info;
use validator::Validate;

/// Hashes on the blocking pool; bcrypt is deliberately slow.
async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))
}

/// POST /api/users
/// Body: { "email": "...", "password": "..." }
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let hashed_password = hash_password(payload.password, state.bcrypt_cost).await?;
    let user = state.repo.create_user(&payload.email, &hashed_password).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users
/// Headers: Authorization: Bearer <access token>
/// Body: { "email": "...", "password": "..." }
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id = state.tokens.authorize(&headers, TokenRole::Access).await?;

    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let hashed_password = hash_password(payload.password, state.bcrypt_cost).await?;
    let user = state
        .repo
        .update_user(user_id, &payload.email, &hashed_password)
        .await?;

    Ok(Json(user))
}

/// POST /api/login
/// Body: { "email": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state
        .repo
        .authenticate(&payload.email, &payload.password)
        .await?;

    let token = state.tokens.issue(user.id, TokenRole::Access)?;
    let refresh_token = state.tokens.issue(user.id, TokenRole::Refresh)?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        user,
        token,
        refresh_token,
    }))
}

/// GET /api/users/me
/// Headers: Authorization: Bearer <access token>
pub async fn get_current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user_id = state.tokens.authorize(&headers, TokenRole::Access).await?;
    Ok(Json(state.repo.get_user(user_id).await?))
}
