//! PageForge API Server - page-level PDF transformations over HTTP
//!
//! Provides multipart endpoints for:
//! - Merging, splitting, rotating, and reorganizing pages
//! - Text and image watermarks
//! - Password-protection detection
//! - Stored-result delivery for large outputs

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;
mod store;

use state::AppState;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pageforge_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing PageForge API...");
    let state = Arc::new(AppState::new()?);

    // Expired results are cleaned up in the background; the read path also
    // deletes entries it finds expired.
    let sweeper_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sweeper_state.store.sweep().await {
                Ok(0) => {}
                Ok(evicted) => info!("Evicted {} expired results", evicted),
                Err(e) => tracing::error!("Result sweep failed: {}", e),
            }
        }
    });

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload: usize = std::env::var("PAGEFORGE_MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Page transformations
        .route("/api/merge", post(handlers::merge))
        .route("/api/rotate", post(handlers::process_pages))
        .route("/api/delete-pages", post(handlers::process_pages))
        .route("/api/process-pages", post(handlers::process_pages))
        .route("/api/organize", post(handlers::organize))
        .route("/api/split", post(handlers::split))
        .route("/api/watermark", post(handlers::watermark))
        .route("/api/unlock", post(handlers::unlock))
        // Stored-result delivery
        .route("/api/download/:id", get(handlers::download))
        // Add middleware
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting PageForge API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
