pub mod admin;
pub mod health;
pub mod post;
pub mod token;
pub mod user;
pub mod webhook;

use crate::{
    AppState,
    middleware::{count_hits, rate_limit},
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Builds the full application router.
pub fn router(state: AppState, assets_dir: &Path) -> Router {
    let api_routes = Router::new()
        // Public routes (no auth required)
        .route("/healthz", get(health::health_check))
        .route("/reset", post(admin::reset_hits))
        .route("/users", post(user::create_user).put(user::update_user))
        .route("/login", post(user::login))
        // Protected routes (auth required)
        .route("/users/me", get(user::get_current_user))
        .route("/chirps", post(post::create_post).get(post::get_posts))
        .route("/chirps/{id}", get(post::get_post).delete(post::delete_post))
        .route("/refresh", post(token::refresh))
        .route("/revoke", post(token::revoke))
        .route("/polka/webhooks", post(webhook::polka_webhook))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let admin_routes = Router::new().route("/metrics", get(admin::metrics));

    let file_routes = Router::new()
        .nest_service("/app", ServeDir::new(assets_dir))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .nest("/admin", admin_routes)
        .merge(file_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
