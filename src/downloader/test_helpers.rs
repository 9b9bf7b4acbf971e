//! Mock collaborators and a context harness for downloader tests.
//!
//! The mocks count every call so tests can assert not just outcomes but
//! how many fetches/transfers it took to get there.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::client::{
    ArtworkFetcher, Downloadable, MetadataClient, PlaylistMetadata, PlaylistScraper, PostProcessor,
    ProgressCallback, ScrapedEntry, ScrapedPlaylist, TrackMetadata,
};
use crate::config::Config;
use crate::context::SessionContext;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::events::EventBus;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use url::Url;

/// Minimal streamable track metadata
pub fn track_meta(id: &str, title: &str, artist: &str) -> TrackMetadata {
    TrackMetadata {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: "Test Album".to_string(),
        track_number: 1,
        disc_number: 1,
        disc_total: 1,
        cover_url: None,
        streamable: true,
    }
}

/// How a [`MockClient`] serves transfers for one track
#[derive(Clone)]
pub struct TransferSpec {
    /// Reported size in bytes
    pub size: u64,
    /// Number of initial attempts that fail before one succeeds
    pub failing_attempts: usize,
}

impl Default for TransferSpec {
    fn default() -> Self {
        Self {
            size: 1000,
            failing_attempts: 0,
        }
    }
}

/// Scriptable metadata client with call counters
pub struct MockClient {
    source: String,
    tracks: Mutex<HashMap<String, TrackMetadata>>,
    playlists: Mutex<HashMap<String, PlaylistMetadata>>,
    search_results: Mutex<HashMap<String, Vec<TrackMetadata>>>,
    transfers: Mutex<HashMap<String, TransferSpec>>,
    /// get_track_metadata calls
    pub metadata_calls: AtomicUsize,
    /// search calls
    pub search_calls: AtomicUsize,
    /// get_downloadable calls
    pub downloadable_calls: AtomicUsize,
    /// transfer attempts per track id, shared into every downloadable
    transfer_attempts: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockClient {
    /// Empty client for the given source name
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            tracks: Mutex::new(HashMap::new()),
            playlists: Mutex::new(HashMap::new()),
            search_results: Mutex::new(HashMap::new()),
            transfers: Mutex::new(HashMap::new()),
            metadata_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            downloadable_calls: AtomicUsize::new(0),
            transfer_attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a track with default transfer behavior
    pub fn with_track(self, metadata: TrackMetadata) -> Self {
        self.add_track(metadata, TransferSpec::default());
        self
    }

    /// Register a track with explicit transfer behavior
    pub fn with_track_transfer(self, metadata: TrackMetadata, spec: TransferSpec) -> Self {
        self.add_track(metadata, spec);
        self
    }

    /// Register a playlist (tracks must be registered separately)
    pub fn with_playlist(self, playlist: PlaylistMetadata) -> Self {
        self.playlists
            .lock()
            .unwrap()
            .insert(playlist.id.clone(), playlist);
        self
    }

    /// Register search results for an exact query
    pub fn with_search_result(self, query: &str, results: Vec<TrackMetadata>) -> Self {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    fn add_track(&self, metadata: TrackMetadata, spec: TransferSpec) {
        self.transfers
            .lock()
            .unwrap()
            .insert(metadata.id.clone(), spec);
        self.tracks
            .lock()
            .unwrap()
            .insert(metadata.id.clone(), metadata);
    }

    /// Attempts recorded against one track id
    pub fn attempts_for(&self, track_id: &str) -> usize {
        self.transfer_attempts
            .lock()
            .unwrap()
            .get(track_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MetadataClient for MockClient {
    fn source(&self) -> &str {
        &self.source
    }

    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<TrackMetadata>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_track_metadata(&self, track_id: &str) -> Result<TrackMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.tracks
            .lock()
            .unwrap()
            .get(track_id)
            .cloned()
            .ok_or_else(|| Error::Client(format!("no such track: {track_id}")))
    }

    async fn get_playlist_metadata(&self, playlist_id: &str) -> Result<PlaylistMetadata> {
        self.playlists
            .lock()
            .unwrap()
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| Error::Client(format!("no such playlist: {playlist_id}")))
    }

    async fn get_downloadable(&self, track_id: &str) -> Result<Box<dyn Downloadable>> {
        self.downloadable_calls.fetch_add(1, Ordering::SeqCst);
        let spec = self
            .transfers
            .lock()
            .unwrap()
            .get(track_id)
            .cloned()
            .ok_or_else(|| Error::Client(format!("no such track: {track_id}")))?;

        Ok(Box::new(MockDownloadable {
            track_id: track_id.to_string(),
            spec,
            attempts_seen: AtomicUsize::new(0),
            attempts: self.transfer_attempts.clone(),
        }))
    }
}

struct MockDownloadable {
    track_id: String,
    spec: TransferSpec,
    attempts_seen: AtomicUsize,
    attempts: Arc<Mutex<HashMap<String, usize>>>,
}

#[async_trait]
impl Downloadable for MockDownloadable {
    async fn size(&self) -> Result<Option<u64>> {
        Ok(Some(self.spec.size))
    }

    async fn download(&self, path: &Path, callback: ProgressCallback) -> Result<()> {
        let attempt = self.attempts_seen.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(self.track_id.clone())
            .or_insert(0) += 1;

        if attempt <= self.spec.failing_attempts {
            return Err(Error::Transfer(format!(
                "simulated failure on attempt {attempt}"
            )));
        }

        // Two chunk callbacks: halfway, then the rest
        let half = self.spec.size / 2;
        callback(half);
        callback(self.spec.size - half);

        tokio::fs::write(path, vec![0u8; self.spec.size as usize]).await?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "flac"
    }
}

/// Scraper returning a fixed entry list
pub struct MockScraper {
    /// Playlist name to report
    pub name: String,
    /// (title, artist) rows to report
    pub entries: Vec<(String, String)>,
    /// Fail every scrape with a scrape error
    pub fail: bool,
}

#[async_trait]
impl PlaylistScraper for MockScraper {
    async fn scrape(&self, url: &Url) -> Result<ScrapedPlaylist> {
        if self.fail {
            return Err(Error::Scrape(format!("cannot scrape {url}")));
        }
        Ok(ScrapedPlaylist {
            name: self.name.clone(),
            entries: self
                .entries
                .iter()
                .map(|(title, artist)| ScrapedEntry {
                    title: title.clone(),
                    artist: artist.clone(),
                })
                .collect(),
        })
    }
}

/// Artwork fetcher with a scripted URL answer and call counters
pub struct MockArtwork {
    /// Answer returned by `cover_url`
    pub url: Option<String>,
    /// cover_url calls
    pub url_calls: AtomicUsize,
    /// download calls
    pub download_calls: AtomicUsize,
}

impl MockArtwork {
    /// Fetcher that reports the given cover URL (or none)
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(str::to_string),
            url_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArtworkFetcher for MockArtwork {
    async fn cover_url(&self, _metadata: &TrackMetadata) -> Result<Option<String>> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.url.clone())
    }

    async fn download(&self, _cover_url: &str, dir: &Path) -> Result<PathBuf> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("cover.jpg");
        tokio::fs::write(&path, b"jpg").await?;
        Ok(path)
    }
}

/// Post-processor that can be told to fail, with a call counter
pub struct MockPostProcessor {
    /// Fail every process call
    pub fail: bool,
    /// process calls
    pub calls: AtomicUsize,
}

impl MockPostProcessor {
    /// Always-succeeding processor
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PostProcessor for MockPostProcessor {
    async fn process(
        &self,
        _file: &Path,
        _metadata: &TrackMetadata,
        _cover: Option<&Path>,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::PostProcess("simulated tagging failure".to_string()));
        }
        Ok(())
    }
}

/// A ready-to-use context over a temp directory and fresh database
pub struct TestHarness {
    /// Injected context
    pub ctx: Arc<SessionContext>,
    /// The live bus behind `ctx.events`
    pub bus: Arc<EventBus>,
    /// Owns the database file and download dir
    pub dir: TempDir,
}

/// Build a harness with the given clients and optional scraper
///
/// The first client's source becomes the configured primary; the second
/// (if any) becomes the fallback.
pub async fn harness(
    clients: Vec<Arc<MockClient>>,
    scraper: Option<Arc<MockScraper>>,
) -> TestHarness {
    harness_with(clients, scraper, Arc::new(MockArtwork::new(None)), Arc::new(MockPostProcessor::new()), 4).await
}

/// [`harness`] with explicit artwork/post-processing/concurrency
pub async fn harness_with(
    clients: Vec<Arc<MockClient>>,
    scraper: Option<Arc<MockScraper>>,
    artwork: Arc<MockArtwork>,
    post_processor: Arc<MockPostProcessor>,
    max_concurrent: usize,
) -> TestHarness {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(Database::new(&dir.path().join("test.db")).await.unwrap());
    let bus = Arc::new(EventBus::new());

    let mut config = Config::default();
    config.download.download_dir = dir.path().join("downloads");
    config.download.max_concurrent_downloads = max_concurrent;
    if let Some(first) = clients.first() {
        config.search.primary_source = first.source().to_string();
    }
    if let Some(second) = clients.get(1) {
        config.search.fallback_source = Some(second.source().to_string());
    }

    let client_map = clients
        .into_iter()
        .map(|client| {
            (
                client.source().to_string(),
                client as Arc<dyn MetadataClient>,
            )
        })
        .collect();

    let ctx = Arc::new(SessionContext {
        db,
        events: bus.clone(),
        config: Arc::new(config),
        clients: client_map,
        scraper: scraper.map(|s| s as Arc<dyn PlaylistScraper>),
        artwork,
        post_processor,
        download_semaphore: Arc::new(Semaphore::new(max_concurrent)),
    });

    TestHarness { ctx, bus, dir }
}
