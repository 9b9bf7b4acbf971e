//! Collaborator trait seams for playlist-dl
//!
//! The library is transport-agnostic: streaming-service protocol details,
//! HTML scraping, artwork retrieval, and file tagging live behind the
//! traits defined here. Production code provides real implementations;
//! tests provide mocks.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Per-chunk transfer progress callback, called with the chunk byte count
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Metadata for a single track as reported by a streaming source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Source-scoped track id
    pub id: String,
    /// Track title
    pub title: String,
    /// Track artist
    pub artist: String,
    /// Album name
    pub album: String,
    /// Track number within the album (or playlist position after renumbering)
    pub track_number: u32,
    /// Disc number, 1-based
    pub disc_number: u32,
    /// Total discs in the album
    pub disc_total: u32,
    /// Cover art URL, if the source reports one
    pub cover_url: Option<String>,
    /// Whether the source allows streaming/downloading this track
    pub streamable: bool,
}

/// Metadata for a playlist as reported by a streaming source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    /// Source-scoped playlist id
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered track metadata
    pub tracks: Vec<TrackMetadata>,
}

/// A playlist scraped from an external (non-streaming-service) page
#[derive(Debug, Clone)]
pub struct ScrapedPlaylist {
    /// Display name taken from the page
    pub name: String,
    /// Ordered (title, artist) pairs
    pub entries: Vec<ScrapedEntry>,
}

/// One row scraped from an external playlist page
#[derive(Debug, Clone)]
pub struct ScrapedEntry {
    /// Track title as shown on the page
    pub title: String,
    /// Artist as shown on the page
    pub artist: String,
}

/// A resolved byte-stream handle for one track
///
/// Produced by [`MetadataClient::get_downloadable`] once a track is known
/// to be streamable. The handle owns everything needed to transfer the
/// bytes (signed URL, decryption key, whatever the source requires).
#[async_trait]
pub trait Downloadable: Send + Sync {
    /// Total size in bytes, if the source reports it ahead of time
    async fn size(&self) -> Result<Option<u64>>;

    /// Stream the bytes to `path`, invoking `callback` per chunk written
    async fn download(&self, path: &Path, callback: ProgressCallback) -> Result<()>;

    /// File extension for the target path (e.g. "flac", "mp3")
    fn extension(&self) -> &str;
}

/// Streaming-service capability: metadata, search, and downloadables
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Source name this client serves (e.g. "qobuz")
    fn source(&self) -> &str;

    /// Search for tracks matching a free-text query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackMetadata>>;

    /// Fetch metadata for a single track
    async fn get_track_metadata(&self, track_id: &str) -> Result<TrackMetadata>;

    /// Fetch metadata for a playlist, including all its tracks
    async fn get_playlist_metadata(&self, playlist_id: &str) -> Result<PlaylistMetadata>;

    /// Resolve a streamable track into a byte-stream handle
    async fn get_downloadable(&self, track_id: &str) -> Result<Box<dyn Downloadable>>;
}

/// Turns an external playlist URL into a name plus (title, artist) pairs
#[async_trait]
pub trait PlaylistScraper: Send + Sync {
    /// Scrape the page (pagination included) into an ordered entry list
    async fn scrape(&self, url: &Url) -> Result<ScrapedPlaylist>;
}

/// Resolves and downloads embeddable cover art
#[async_trait]
pub trait ArtworkFetcher: Send + Sync {
    /// Find a cover URL for the track, `None` when no art exists
    async fn cover_url(&self, metadata: &TrackMetadata) -> Result<Option<String>>;

    /// Download the cover into `dir`, returning the local path
    async fn download(&self, cover_url: &str, dir: &Path) -> Result<PathBuf>;
}

/// Tags and/or converts a downloaded file in place
#[async_trait]
pub trait PostProcessor: Send + Sync {
    /// Process the downloaded file, embedding the cover when present
    async fn process(
        &self,
        file: &Path,
        metadata: &TrackMetadata,
        cover: Option<&Path>,
    ) -> Result<()>;
}

/// Artwork fetcher that never finds any art
///
/// Stand-in for deployments without an artwork source configured.
pub struct NoOpArtworkFetcher;

#[async_trait]
impl ArtworkFetcher for NoOpArtworkFetcher {
    async fn cover_url(&self, _metadata: &TrackMetadata) -> Result<Option<String>> {
        Ok(None)
    }

    async fn download(&self, cover_url: &str, _dir: &Path) -> Result<PathBuf> {
        Err(crate::error::Error::Other(format!(
            "no artwork fetcher configured, cannot download {cover_url}"
        )))
    }
}

/// Post-processor that leaves files untouched
pub struct NoOpPostProcessor;

#[async_trait]
impl PostProcessor for NoOpPostProcessor {
    async fn process(
        &self,
        _file: &Path,
        _metadata: &TrackMetadata,
        _cover: Option<&Path>,
    ) -> Result<()> {
        Ok(())
    }
}
