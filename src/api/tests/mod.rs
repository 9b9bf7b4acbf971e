use super::*;
use crate::config::Config;
use crate::downloader::Collaborators;
use crate::downloader::test_helpers::{MockArtwork, MockClient, MockPostProcessor, MockScraper};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// Build a downloader over a temp directory with one mock client
///
/// The client is named "qobuz" to match the default primary source and
/// answers the query "Artist - Song" with one track, so a scraped
/// playlist of that pair resolves end to end.
async fn test_downloader() -> (Arc<PlaylistDownloader>, TempDir) {
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.database_path = dir.path().join("test.db");
    config.download.download_dir = dir.path().join("downloads");

    let track = crate::downloader::test_helpers::track_meta("t1", "Song", "Artist");
    let client = Arc::new(
        MockClient::new("qobuz")
            .with_track(track.clone())
            .with_search_result("Artist - Song", vec![track]),
    );

    let scraper = Arc::new(MockScraper {
        name: "Weekly Mix".to_string(),
        entries: vec![("Song".to_string(), "Artist".to_string())],
        fail: false,
    });

    let downloader = PlaylistDownloader::new(
        config,
        Collaborators {
            clients: vec![client],
            scraper: Some(scraper),
            artwork: Arc::new(MockArtwork::new(None)),
            post_processor: Arc::new(MockPostProcessor::new()),
        },
    )
    .await
    .unwrap();

    (Arc::new(downloader), dir)
}

/// Parse a JSON response body
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (downloader, _dir) = test_downloader().await;

    // Port 0 so the OS assigns a free port
    let router = create_router(downloader);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (downloader, _dir) = test_downloader().await;
    let app = create_router(downloader);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_disabled_omits_headers() {
    let (downloader, dir) = test_downloader().await;

    let mut config = (**downloader.config()).clone();
    config.api.cors_enabled = false;
    config.database_path = dir.path().join("test2.db");

    let track = crate::downloader::test_helpers::track_meta("t1", "Song", "Artist");
    let downloader = PlaylistDownloader::new(
        config,
        Collaborators {
            clients: vec![Arc::new(MockClient::new("qobuz").with_track(track))],
            scraper: None,
            artwork: Arc::new(MockArtwork::new(None)),
            post_processor: Arc::new(MockPostProcessor::new()),
        },
    )
    .await
    .unwrap();
    let app = create_router(Arc::new(downloader));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
