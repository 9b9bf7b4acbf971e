//! In-process progress event bus
//!
//! Publishers (resolvers, downloaders, orchestrators) push
//! [`ProgressEvent`]s through a [`ProgressSink`]; observers subscribe and
//! receive a snapshot of everything retained so far followed by live
//! events. Delivery is strictly non-blocking for publishers: each
//! observer has a bounded queue and is disconnected if it falls behind.

use crate::types::{
    ConnectionEvent, PlaylistEvent, PlaylistStatus, ProgressEvent, SearchEvent, TrackEvent,
    TrackStatus, now_timestamp,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

/// Per-observer queue capacity; a publisher finding this queue full
/// disconnects the observer rather than waiting.
const OBSERVER_QUEUE_CAPACITY: usize = 50;

/// Where pipeline components report progress
///
/// Implemented by [`EventBus`] for live observers and by [`NoOpProgress`]
/// when progress reporting is not wired up (batch/CLI embedding).
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Must never block and must never fail the caller.
    fn publish(&self, event: ProgressEvent);
}

/// Sink that discards every event
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn publish(&self, _event: ProgressEvent) {}
}

/// Retained-state counts, served by `/health` and `/api/downloads`
#[derive(Debug, Clone, Copy)]
pub struct BusCounts {
    /// Playlists with a retained aggregate event
    pub playlists: usize,
    /// Tracks with a retained progress event
    pub tracks: usize,
    /// Currently connected observers
    pub observers: usize,
}

struct BusInner {
    tracks: HashMap<String, TrackEvent>,
    playlists: HashMap<String, PlaylistEvent>,
    searches: HashMap<String, SearchEvent>,
    observers: HashMap<String, mpsc::Sender<ProgressEvent>>,
}

/// Bounded fan-out event bus with last-value retention
///
/// Retains the latest event per track, playlist, and search so a late
/// subscriber starts from current state instead of an empty screen.
/// The internal lock is only ever held for map operations, never across
/// an await point.
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus with no observers
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                tracks: HashMap::new(),
                playlists: HashMap::new(),
                searches: HashMap::new(),
                observers: HashMap::new(),
            }),
        }
    }

    /// Register a new observer
    ///
    /// The returned [`Observer`] yields a connection acknowledgement,
    /// then the retained snapshot (playlists, tracks, searches), then
    /// live events in publish order.
    pub fn subscribe(&self) -> Observer {
        let connection_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(OBSERVER_QUEUE_CAPACITY);

        let mut inner = self.lock();

        // Snapshot is delivered out-of-band from the bounded queue so a
        // large retained state cannot disconnect a fresh observer.
        let mut initial: Vec<ProgressEvent> =
            Vec::with_capacity(1 + inner.playlists.len() + inner.tracks.len() + inner.searches.len());
        initial.push(ConnectionEvent::connected(connection_id.clone()).into());
        initial.extend(inner.playlists.values().cloned().map(ProgressEvent::from));
        initial.extend(inner.tracks.values().cloned().map(ProgressEvent::from));
        initial.extend(inner.searches.values().cloned().map(ProgressEvent::from));

        inner.observers.insert(connection_id.clone(), tx);
        tracing::debug!(connection_id = %connection_id, "observer subscribed");

        Observer {
            connection_id,
            initial,
            rx,
        }
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Retained-state counts
    pub fn counts(&self) -> BusCounts {
        let inner = self.lock();
        BusCounts {
            playlists: inner.playlists.len(),
            tracks: inner.tracks.len(),
            observers: inner.observers.len(),
        }
    }

    /// Latest retained event for a track, if any
    pub fn track_state(&self, track_id: &str) -> Option<TrackEvent> {
        self.lock().tracks.get(track_id).cloned()
    }

    /// Latest retained aggregate for a playlist, if any
    pub fn playlist_state(&self, playlist_id: &str) -> Option<PlaylistEvent> {
        self.lock().playlists.get(playlist_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        // A poisoned bus lock means a panic mid-map-update; the maps are
        // still structurally valid, so keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver an event to every observer, dropping the slow and the gone
    fn fan_out(inner: &mut BusInner, event: &ProgressEvent) {
        inner.observers.retain(|connection_id, tx| {
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "observer queue full, disconnecting"
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %connection_id, "observer gone, removing");
                    false
                }
            }
        });
    }

    /// Recompute aggregate counts for every retained playlist
    ///
    /// Returns the playlists whose aggregates changed; each is retained
    /// with a fresh timestamp and must be fanned out by the caller.
    /// Terminal playlists never transition again, and a playlist with no
    /// retained track events is left alone: skipped tracks publish no
    /// events, so its counts cannot be derived from the track map.
    fn recompute_playlists(inner: &mut BusInner) -> Vec<PlaylistEvent> {
        let mut changed = Vec::new();

        for playlist in inner.playlists.values_mut() {
            if matches!(
                playlist.status,
                PlaylistStatus::Completed | PlaylistStatus::Failed
            ) {
                continue;
            }

            let mut tracked = 0usize;
            let mut found = 0usize;
            let mut completed = 0usize;
            let mut failed = 0usize;

            for track in inner.tracks.values() {
                if track.playlist_id.as_deref() != Some(playlist.playlist_id.as_str()) {
                    continue;
                }
                tracked += 1;
                match track.status {
                    TrackStatus::Found | TrackStatus::Downloading | TrackStatus::Completed => {
                        found += 1
                    }
                    TrackStatus::Searching | TrackStatus::Failed => {}
                }
                match track.status {
                    TrackStatus::Completed => completed += 1,
                    TrackStatus::Failed => failed += 1,
                    _ => {}
                }
            }

            if tracked == 0 {
                continue;
            }

            if playlist.found_tracks == found
                && playlist.completed_tracks == completed
                && playlist.failed_tracks == failed
            {
                continue;
            }

            playlist.found_tracks = found;
            playlist.completed_tracks = completed;
            playlist.failed_tracks = failed;
            playlist.timestamp = now_timestamp();

            if playlist.total_tracks > 0 && completed + failed == playlist.total_tracks {
                playlist.status = PlaylistStatus::Completed;
            } else if completed > 0 || found > 0 {
                playlist.status = PlaylistStatus::Downloading;
            }

            changed.push(playlist.clone());
        }

        changed
    }
}

impl ProgressSink for EventBus {
    fn publish(&self, event: ProgressEvent) {
        let mut inner = self.lock();

        let is_track_update = match &event {
            ProgressEvent::Track(track) => {
                inner.tracks.insert(track.track_id.clone(), track.clone());
                true
            }
            ProgressEvent::Playlist(playlist) => {
                inner
                    .playlists
                    .insert(playlist.playlist_id.clone(), playlist.clone());
                false
            }
            ProgressEvent::Search(search) => {
                inner
                    .searches
                    .insert(search.playlist_id.clone(), search.clone());
                false
            }
            ProgressEvent::Connection(_) => false,
        };

        Self::fan_out(&mut inner, &event);

        // Aggregates are recomputed synchronously with the track publish
        // so observers never see a track ahead of its playlist counts.
        if is_track_update {
            for playlist_event in Self::recompute_playlists(&mut inner) {
                Self::fan_out(&mut inner, &ProgressEvent::Playlist(playlist_event));
            }
        }
    }
}

/// One subscribed observer's receiving end
pub struct Observer {
    /// Generated id for this connection, echoed in the acknowledgement
    pub connection_id: String,
    initial: Vec<ProgressEvent>,
    rx: mpsc::Receiver<ProgressEvent>,
}

impl Observer {
    /// Consume the observer into a stream: acknowledgement, snapshot,
    /// then live events. Dropping the stream releases the bus-side slot
    /// on the next publish.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send {
        tokio_stream::iter(self.initial).chain(ReceiverStream::new(self.rx))
    }
}
