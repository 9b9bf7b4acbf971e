//! REST API server module
//!
//! Exposes the downloader over HTTP: playlist submission, task
//! management, health, and the live progress stream.

use crate::{Error, PlaylistDownloader, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Downloads
/// - `POST /api/lastfm` - Submit an external playlist URL
/// - `GET /api/downloads` - List in-flight submissions and counts
/// - `DELETE /api/downloads/:task_id` - Cancel a submission
///
/// ## System
/// - `GET /events` - Server-sent events stream
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(downloader: Arc<PlaylistDownloader>) -> Router {
    let config = downloader.config().clone();
    let state = AppState::new(downloader);

    let router = Router::new()
        // Downloads
        .route("/api/lastfm", post(routes::submit_lastfm))
        .route("/api/downloads", get(routes::list_downloads))
        .route("/api/downloads/:task_id", delete(routes::cancel_download))
        // System
        .route("/events", get(routes::event_stream))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins ("*" allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until the server stops.
pub async fn start_api_server(downloader: Arc<PlaylistDownloader>) -> Result<()> {
    let bind_address = downloader.config().api.bind_address;
    let router = create_router(downloader);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(|e| Error::ApiServerError(format!("failed to bind {bind_address}: {e}")))?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| Error::ApiServerError(e.to_string()))?;

    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
