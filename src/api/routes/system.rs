//! System handlers: health, OpenAPI, events.

use crate::api::AppState;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;

/// Idle interval before a `: keepalive` comment is written to the stream
const SSE_KEEPALIVE: Duration = Duration::from_secs(30);

/// GET /health - Health check with activity counts
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let counts = state.downloader.counts();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "total_clients": counts.observers,
        "total_playlists": counts.playlists,
        "total_tracks": counts.tracks,
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
///
/// Yields a connection acknowledgement, the retained snapshot, then live
/// events; each as `event: <type>` with a JSON `data:` payload.
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let observer = state.downloader.subscribe();

    let sse_stream = observer.into_stream().filter_map(|event| {
        let event_type = event.event_type();
        match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default().event(event_type).data(json_data))),
            Err(e) => {
                tracing::warn!("Failed to serialize event to JSON: {}", e);
                None
            }
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(SSE_KEEPALIVE).text("keepalive"))
}
