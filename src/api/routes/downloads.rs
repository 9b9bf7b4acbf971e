//! Download submission and task management handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Request body for submitting an external playlist
#[derive(Debug, Deserialize, ToSchema)]
pub struct LastfmRequest {
    /// Playlist page URL to scrape
    pub url: String,
    /// Source to search, defaults to the configured primary
    #[serde(default)]
    pub source: Option<String>,
    /// Fallback source, defaults to the configured fallback
    #[serde(default)]
    pub fallback_source: Option<String>,
}

/// Response for an accepted submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    /// Generated id, usable with `DELETE /api/downloads/{task_id}`
    pub task_id: String,
    /// Always "started"
    pub status: String,
}

/// Snapshot of in-flight submissions and retained progress state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveDownloads {
    /// Task ids currently running
    pub active: Vec<String>,
    /// Connected event-stream observers
    pub total_clients: usize,
    /// Playlists with retained progress
    pub total_playlists: usize,
    /// Tracks with retained progress
    pub total_tracks: usize,
}

/// POST /api/lastfm - Submit an external playlist for download
#[utoipa::path(
    post,
    path = "/api/lastfm",
    tag = "downloads",
    request_body = LastfmRequest,
    responses(
        (status = 200, description = "Submission accepted", body = SubmissionResponse),
        (status = 400, description = "Invalid URL or unknown source name")
    )
)]
pub async fn submit_lastfm(
    State(state): State<AppState>,
    Json(request): Json<LastfmRequest>,
) -> Result<Json<SubmissionResponse>> {
    let url = Url::parse(&request.url)
        .map_err(|_| Error::InvalidRequest(format!("invalid url: {}", request.url)))?;

    let task_id =
        state
            .downloader
            .submit_external_playlist(url, request.source, request.fallback_source)?;

    Ok(Json(SubmissionResponse {
        task_id,
        status: "started".to_string(),
    }))
}

/// GET /api/downloads - List in-flight submissions and progress counts
#[utoipa::path(
    get,
    path = "/api/downloads",
    tag = "downloads",
    responses(
        (status = 200, description = "Current download activity", body = ActiveDownloads)
    )
)]
pub async fn list_downloads(State(state): State<AppState>) -> Json<ActiveDownloads> {
    let counts = state.downloader.counts();
    Json(ActiveDownloads {
        active: state.downloader.active_tasks(),
        total_clients: counts.observers,
        total_playlists: counts.playlists,
        total_tracks: counts.tracks,
    })
}

/// DELETE /api/downloads/{task_id} - Cancel an in-flight submission
#[utoipa::path(
    delete,
    path = "/api/downloads/{task_id}",
    tag = "downloads",
    params(
        ("task_id" = String, Path, description = "Task id returned at submission")
    ),
    responses(
        (status = 200, description = "Submission cancelled"),
        (status = 404, description = "No such task")
    )
)]
pub async fn cancel_download(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    if state.downloader.cancel_task(&task_id) {
        Ok(Json(serde_json::json!({ "status": "cancelled" })))
    } else {
        Err(Error::NotFound(format!("task {task_id}")))
    }
}
