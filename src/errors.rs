use crate::{auth::TokenError, store::StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    UserAlreadyExists,
    MissingAuthorization,
    Unauthorized,
    Forbidden,
    NotFound(String),
    ValidationError(String),
    TooManyRequests,
    InternalError(String),
}

/// Convert our custom errors to HTTP responses
///
/// Server-side failures are logged here and replaced with a generic message,
/// so file paths and parser output never reach the client.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::UserAlreadyExists => (StatusCode::CONFLICT, "Email already in use"),
            ApiError::MissingAuthorization => (StatusCode::UNAUTHORIZED, "Missing authorization"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            ApiError::NotFound(msg) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
            }
            ApiError::ValidationError(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": message
            })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity, id) => {
                ApiError::NotFound(format!("{entity} {id} not found"))
            }
            StoreError::Conflict(_) => ApiError::UserAlreadyExists,
            StoreError::Unauthorized { .. } => ApiError::Forbidden,
            // both reasons collapse into one response to avoid account enumeration
            StoreError::InvalidCredentials(reason) => {
                debug!(%reason, "login rejected");
                ApiError::InvalidCredentials
            }
            StoreError::Io(_) | StoreError::CorruptState(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Ledger(store) => store.into(),
            TokenError::Signing(_) => ApiError::InternalError(err.to_string()),
            TokenError::Malformed(_)
            | TokenError::Expired
            | TokenError::WrongIssuer { .. }
            | TokenError::Revoked
            | TokenError::MalformedSubject(_) => ApiError::Unauthorized,
        }
    }
}
