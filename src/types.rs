//! Core types for playlist-dl
//!
//! Progress events published on the event bus and delivered to SSE
//! observers, plus the status enums they carry. Every event records the
//! unix timestamp of its last update so consumers can order replays.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Current unix timestamp in fractional seconds
pub fn now_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Lifecycle status of a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    /// A search query is running for this track
    Searching,
    /// Metadata resolved, not yet transferring bytes
    Found,
    /// Transfer in progress
    Downloading,
    /// Terminal: downloaded, post-processed, and recorded as completed
    Completed,
    /// Failed; terminal unless an error message says a retry is underway
    Failed,
}

/// Lifecycle status of a playlist batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistStatus {
    /// Metadata/scrape phase
    Resolving,
    /// At least one track is being processed
    Downloading,
    /// Terminal: every track reached a terminal state
    Completed,
    /// Terminal: every processed track failed
    Failed,
}

/// Progress update for one track
///
/// Republished (not appended) on every change: observers that subscribe
/// late receive only the latest state per track in their snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackEvent {
    /// Stable track identifier from the streaming source
    pub track_id: String,
    /// Track title
    pub title: String,
    /// Track artist
    pub artist: String,
    /// Current lifecycle status
    pub status: TrackStatus,
    /// Transfer progress percentage, 0-100
    pub progress: f64,
    /// Owning playlist, absent for standalone tracks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    /// Error description when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Unix timestamp of the last update
    pub timestamp: f64,
}

impl TrackEvent {
    /// Create a new event for a track in the given status
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        status: TrackStatus,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            artist: artist.into(),
            status,
            progress: 0.0,
            playlist_id: None,
            error_message: None,
            timestamp: now_timestamp(),
        }
    }

    /// Attach the owning playlist id
    pub fn with_playlist(mut self, playlist_id: Option<String>) -> Self {
        self.playlist_id = playlist_id;
        self
    }

    /// Set the transfer progress percentage
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress.min(100.0);
        self
    }

    /// Set the error description
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Aggregate progress for a playlist batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaylistEvent {
    /// Playlist identifier (source id or generated for scraped playlists)
    pub playlist_id: String,
    /// Display name
    pub name: String,
    /// Current lifecycle status
    pub status: PlaylistStatus,
    /// Number of tracks in the playlist
    pub total_tracks: usize,
    /// Tracks with resolved metadata (found, downloading, or completed)
    pub found_tracks: usize,
    /// Tracks downloaded successfully
    pub completed_tracks: usize,
    /// Tracks that failed terminally
    pub failed_tracks: usize,
    /// Unix timestamp of the last update
    pub timestamp: f64,
}

impl PlaylistEvent {
    /// Create a new event for a playlist in the given status
    pub fn new(
        playlist_id: impl Into<String>,
        name: impl Into<String>,
        status: PlaylistStatus,
        total_tracks: usize,
    ) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            name: name.into(),
            status,
            total_tracks,
            found_tracks: 0,
            completed_tracks: 0,
            failed_tracks: 0,
            timestamp: now_timestamp(),
        }
    }
}

/// Progress of the search phase for a scraped playlist
///
/// Emitted once per (title, artist) pair with running totals, so a
/// consumer can render "searched 17/40, found 15, failed 2" live.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchEvent {
    /// Playlist the search belongs to
    pub playlist_id: String,
    /// The query that was just attempted, e.g. "Artist - Title"
    pub query: String,
    /// Total scraped pairs to search
    pub total: usize,
    /// Pairs matched so far (primary or fallback source)
    pub found: usize,
    /// Pairs with no match on any source so far
    pub failed: usize,
    /// Unix timestamp of the last update
    pub timestamp: f64,
}

impl SearchEvent {
    /// Create a new search progress event
    pub fn new(playlist_id: impl Into<String>, query: impl Into<String>, total: usize) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            query: query.into(),
            total,
            found: 0,
            failed: 0,
            timestamp: now_timestamp(),
        }
    }
}

/// Acknowledgement sent as the first item of every SSE stream
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionEvent {
    /// Always "connected"
    pub status: String,
    /// Generated observer connection id
    pub connection_id: String,
    /// Unix timestamp the observer subscribed
    pub timestamp: f64,
}

impl ConnectionEvent {
    /// Acknowledgement for a new observer connection
    pub fn connected(connection_id: impl Into<String>) -> Self {
        Self {
            status: "connected".to_string(),
            connection_id: connection_id.into(),
            timestamp: now_timestamp(),
        }
    }
}

/// Any event deliverable to a progress observer
///
/// Serialized untagged: the SSE layer names the variant in the `event:`
/// field instead, so the `data:` payload stays flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    /// Per-track progress update
    Track(TrackEvent),
    /// Playlist aggregate update
    Playlist(PlaylistEvent),
    /// Scraped-playlist search progress
    Search(SearchEvent),
    /// Stream connection acknowledgement
    Connection(ConnectionEvent),
}

impl ProgressEvent {
    /// SSE event name for this variant
    pub fn event_type(&self) -> &'static str {
        match self {
            ProgressEvent::Track(_) => "track_update",
            ProgressEvent::Playlist(_) => "playlist_update",
            ProgressEvent::Search(_) => "search_update",
            ProgressEvent::Connection(_) => "connection",
        }
    }
}

impl From<TrackEvent> for ProgressEvent {
    fn from(event: TrackEvent) -> Self {
        ProgressEvent::Track(event)
    }
}

impl From<PlaylistEvent> for ProgressEvent {
    fn from(event: PlaylistEvent) -> Self {
        ProgressEvent::Playlist(event)
    }
}

impl From<SearchEvent> for ProgressEvent {
    fn from(event: SearchEvent) -> Self {
        ProgressEvent::Search(event)
    }
}

impl From<ConnectionEvent> for ProgressEvent {
    fn from(event: ConnectionEvent) -> Self {
        ProgressEvent::Connection(event)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TrackStatus::Downloading).unwrap(),
            "\"downloading\""
        );
        assert_eq!(
            serde_json::to_string(&TrackStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_track_event_builder() {
        let event = TrackEvent::new("t1", "Song", "Artist", TrackStatus::Downloading)
            .with_playlist(Some("p1".into()))
            .with_progress(42.5);

        assert_eq!(event.track_id, "t1");
        assert_eq!(event.status, TrackStatus::Downloading);
        assert_eq!(event.progress, 42.5);
        assert_eq!(event.playlist_id.as_deref(), Some("p1"));
        assert!(event.error_message.is_none());
        assert!(event.timestamp > 0.0);
    }

    #[test]
    fn test_track_event_progress_capped_at_100() {
        let event =
            TrackEvent::new("t1", "Song", "Artist", TrackStatus::Downloading).with_progress(137.2);
        assert_eq!(event.progress, 100.0);
    }

    #[test]
    fn test_track_event_json_omits_absent_fields() {
        let event = TrackEvent::new("t1", "Song", "Artist", TrackStatus::Found);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("playlist_id").is_none());
        assert!(json.get("error_message").is_none());
        assert_eq!(json["status"], "found");
    }

    #[test]
    fn test_progress_event_types() {
        let track: ProgressEvent =
            TrackEvent::new("t1", "Song", "Artist", TrackStatus::Found).into();
        let playlist: ProgressEvent =
            PlaylistEvent::new("p1", "Mix", PlaylistStatus::Downloading, 10).into();
        let search: ProgressEvent = SearchEvent::new("p1", "Artist - Song", 1).into();
        let connection: ProgressEvent = ConnectionEvent::connected("c1").into();

        assert_eq!(track.event_type(), "track_update");
        assert_eq!(playlist.event_type(), "playlist_update");
        assert_eq!(search.event_type(), "search_update");
        assert_eq!(connection.event_type(), "connection");
    }

    #[test]
    fn test_untagged_payload_is_flat() {
        let event: ProgressEvent =
            PlaylistEvent::new("p1", "Mix", PlaylistStatus::Completed, 3).into();
        let json = serde_json::to_value(&event).unwrap();

        // No enum wrapper object around the payload
        assert_eq!(json["playlist_id"], "p1");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["total_tracks"], 3);
    }
}
