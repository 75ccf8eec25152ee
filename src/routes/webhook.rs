use crate::{
    AppState,
    auth::{API_KEY_SCHEME, credential},
    dto::WebhookRequest,
    errors::ApiError,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, warn};

const USER_UPGRADED: &str = "user.upgraded";

/// POST /api/polka/webhooks
/// Headers: Authorization: ApiKey <key>
/// Body: { "event": "user.upgraded", "data": { "user_id": 1 } }
pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let api_key = credential(&headers, API_KEY_SCHEME)?;
    if api_key != &*state.polka_api_key {
        warn!("Webhook rejected: wrong api key");
        return Err(ApiError::Unauthorized);
    }

    let Json(payload) = payload.map_err(|e| ApiError::ValidationError(e.body_text()))?;

    if payload.event != USER_UPGRADED {
        debug!(event = %payload.event, "Webhook event ignored");
        return Ok(StatusCode::NO_CONTENT);
    }

    state.repo.grant_privilege(payload.data.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
