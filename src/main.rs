// ============================================================================
// CHIRPY - SHORT POSTS OVER HTTP, STORED IN ONE JSON FILE
// ============================================================================

// - User signup/login with bcrypt password hashing
// - JWT access + refresh tokens, refresh token revocation
// - Chirps with owner-only deletion
// - Payment webhook that upgrades users
// - Static file server with a hit counter
// - CORS, rate limiting and structured logging

use anyhow::Context;
use chirpy::{AppState, config::Config, routes};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_target(false)
        .compact()
        .init();

    let database_path = config.database_path();
    let state = AppState::from_config(&config)
        .await
        .with_context(|| format!("Could not open database {}", database_path.display()))?;

    let app = routes::router(state, &config.assets_dir);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;

    info!("Server running on http://{}", addr);
    info!("Database: {}", database_path.display());
    info!("API Endpoints:");
    info!("  GET    /api/healthz          - Health check");
    info!("  POST   /api/users            - Create account");
    info!("  PUT    /api/users            - Update account (auth)");
    info!("  GET    /api/users/me         - Current user (auth)");
    info!("  POST   /api/login            - Login");
    info!("  POST   /api/refresh          - New access token (refresh token)");
    info!("  POST   /api/revoke           - Revoke refresh token");
    info!("  POST   /api/chirps           - Create chirp (auth)");
    info!("  GET    /api/chirps           - List chirps");
    info!("  GET    /api/chirps/{{id}}      - Get chirp");
    info!("  DELETE /api/chirps/{{id}}      - Delete chirp (auth, owner only)");
    info!("  POST   /api/polka/webhooks   - Payment webhook (api key)");
    info!("  GET    /admin/metrics        - Hit counter");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(disposable) = config.disposable_database() {
        tokio::fs::remove_file(&disposable)
            .await
            .with_context(|| format!("Could not delete {}", disposable.display()))?;
        info!("Deleted debug database: {}", disposable.display());
    } else {
        info!("Database: {} persists", database_path.display());
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
