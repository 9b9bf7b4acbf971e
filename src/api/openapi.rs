//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the playlist-dl
//! REST API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the playlist-dl REST API
///
/// The spec is served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "playlist-dl REST API",
        version = "0.1.0",
        description = "REST API for submitting playlist downloads and observing live progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    paths(
        // Downloads
        crate::api::routes::submit_lastfm,
        crate::api::routes::list_downloads,
        crate::api::routes::cancel_download,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::api::routes::LastfmRequest,
        crate::api::routes::SubmissionResponse,
        crate::api::routes::ActiveDownloads,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::types::TrackEvent,
        crate::types::PlaylistEvent,
        crate::types::SearchEvent,
        crate::types::ConnectionEvent,
        crate::types::TrackStatus,
        crate::types::PlaylistStatus,
    )),
    tags(
        (name = "downloads", description = "Playlist submission and task management"),
        (name = "system", description = "Health, events, and API metadata")
    )
)]
pub struct ApiDoc;
