//! Application state for the API server

use crate::PlaylistDownloader;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the downloader instance.
#[derive(Clone)]
pub struct AppState {
    /// The main PlaylistDownloader instance
    pub downloader: Arc<PlaylistDownloader>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<PlaylistDownloader>) -> Self {
        Self { downloader }
    }
}
