use axum::Json;
use chrono::Utc;

/// GET /api/healthz
/// Response: 200 OK with JSON
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
      "status": "ok",
      "timestamp": Utc::now().timestamp()
    }))
}
