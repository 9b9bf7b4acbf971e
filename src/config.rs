//! Configuration types for playlist-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};
use utoipa::ToSchema;

/// Download behavior configuration (directories, concurrency, layout)
///
/// Groups settings related to how tracks are fetched and where they land.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Download directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent track transfers across the whole process (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Put standalone singles in their own album folder (default: false)
    #[serde(default)]
    pub add_singles_to_folder: bool,

    /// Create "Disc N" subdirectories for multi-disc albums (default: true)
    #[serde(default = "default_true")]
    pub disc_subdirectories: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            add_singles_to_folder: false,
            disc_subdirectories: true,
        }
    }
}

/// Metadata rewriting applied to playlist tracks before download
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MetadataConfig {
    /// Renumber tracks to their playlist position (default: true)
    #[serde(default = "default_true")]
    pub renumber_playlist_tracks: bool,

    /// Override each track's album with the playlist name (default: false)
    #[serde(default)]
    pub set_playlist_to_album: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            renumber_playlist_tracks: true,
            set_playlist_to_album: false,
        }
    }
}

/// Search source selection for scraped playlists
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchConfig {
    /// Source searched first for every (title, artist) pair
    #[serde(default = "default_primary_source")]
    pub primary_source: String,

    /// Source tried only when the primary returns no results
    #[serde(default)]
    pub fallback_source: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            primary_source: default_primary_source(),
            fallback_source: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8765)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins, "*" for any (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration for PlaylistDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — directories, concurrency, folder layout
/// - [`metadata`](MetadataConfig) — playlist-track metadata rewriting
/// - [`search`](SearchConfig) — primary/fallback source selection
/// - [`api`](ApiConfig) — REST/SSE server binding
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Path to the idempotency database (default: "./downloads.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Playlist-track metadata rewriting
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Search source selection
    #[serde(default)]
    pub search: SearchConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            download: DownloadConfig::default(),
            metadata: MetadataConfig::default(),
            search: SearchConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration, returning the first violation found
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("download.max_concurrent_downloads".to_string()),
            });
        }

        if self.download.download_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "download_dir must not be empty".to_string(),
                key: Some("download.download_dir".to_string()),
            });
        }

        if self.search.primary_source.is_empty() {
            return Err(Error::Config {
                message: "primary_source must not be empty".to_string(),
                key: Some("search.primary_source".to_string()),
            });
        }

        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./downloads.db")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_primary_source() -> String {
    "qobuz".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}
