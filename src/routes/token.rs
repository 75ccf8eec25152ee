use crate::{
    AppState,
    auth::{BEARER_SCHEME, TokenRole, credential},
    dto::TokenResponse,
    errors::ApiError,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

/// POST /api/refresh
/// Headers: Authorization: Bearer <refresh token>
/// Trades a live refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let user_id = state.tokens.authorize(&headers, TokenRole::Refresh).await?;
    let token = state.tokens.issue(user_id, TokenRole::Access)?;

    Ok(Json(TokenResponse { token }))
}

/// POST /api/revoke
/// Headers: Authorization: Bearer <refresh token>
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = credential(&headers, BEARER_SCHEME)?;
    state.tokens.verify(token, TokenRole::Refresh).await?;
    state.repo.revoke(token).await?;

    Ok(StatusCode::NO_CONTENT)
}
