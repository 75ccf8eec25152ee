use crate::AppState;
use axum::{extract::State, response::Html};
use std::sync::atomic::Ordering;

/// GET /admin/metrics
pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <body>\n\
         <h1>Welcome, Chirpy Admin</h1>\n\
         <p>Chirpy has been visited {} times!</p>\n\
         </body>\n\
         </html>",
        state.hits.load(Ordering::Relaxed)
    ))
}

/// POST /api/reset
pub async fn reset_hits(State(state): State<AppState>) -> &'static str {
    state.hits.store(0, Ordering::Relaxed);
    "Hits reset to 0"
}
