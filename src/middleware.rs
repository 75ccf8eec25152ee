use crate::{AppState, errors::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::Ordering;
use tracing::warn;

/// Counts requests to the static file server for `/admin/metrics`.
pub async fn count_hits(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}

/// Global request budget for the API routes.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.limiter.check().is_err() {
        warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }
    Ok(next.run(request).await)
}
