//! Track resolution.
//!
//! Turns a track reference into a [`Track`] holding its metadata, a
//! byte-stream handle, and (when available) locally cached cover art.
//! The ledger is consulted before any network call: a completed id is
//! skipped without a single metadata fetch.

use crate::client::{Downloadable, TrackMetadata};
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::media::Resolution;
use crate::types::{TrackEvent, TrackStatus};
use crate::utils::sanitize_filename;
use std::path::PathBuf;

/// One track requested on its own
#[derive(Debug, Clone)]
pub struct PendingSingle {
    /// Source-scoped track id
    pub id: String,
    /// Streaming source name
    pub source: String,
}

/// One track inside a playlist batch
#[derive(Debug, Clone)]
pub struct PendingPlaylistTrack {
    /// Source-scoped track id
    pub id: String,
    /// Streaming source that will serve the bytes
    pub source: String,
    /// Owning playlist id, propagated into every event
    pub playlist_id: String,
    /// Playlist display name, used for the target folder
    pub playlist_name: String,
    /// 1-based position within the playlist
    pub position: u32,
}

/// A fully resolved track, ready to transfer
pub struct Track {
    /// Metadata after any playlist transforms
    pub metadata: TrackMetadata,
    /// Byte-stream handle from the serving client
    pub downloadable: Box<dyn Downloadable>,
    /// Locally downloaded cover art, if any
    pub cover_path: Option<PathBuf>,
    /// Owning playlist, absent for standalone tracks
    pub playlist_id: Option<String>,
    /// Source that served the metadata (fallback source for
    /// fallback-resolved search hits)
    pub source: String,
    /// Directory the file will be written into
    pub folder: PathBuf,
}

impl PendingSingle {
    /// Resolve a standalone track
    pub async fn resolve(&self, ctx: &SessionContext) -> Result<Resolution<Track>> {
        if ctx.db.is_completed(&self.id).await? {
            tracing::info!(track_id = %self.id, "already downloaded, skipping");
            return Ok(Resolution::Skipped);
        }

        let client = match ctx.client(&self.source) {
            Ok(client) => client,
            Err(e) => {
                return fail_track(ctx, &self.source, &self.id, None, &e).await;
            }
        };

        let metadata = match client.get_track_metadata(&self.id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return fail_track(ctx, &self.source, &self.id, None, &e).await;
            }
        };

        if !metadata.streamable {
            let e = Error::NotStreamable {
                id: self.id.clone(),
                source_name: self.source.clone(),
                reason: "source reports track as not streamable".to_string(),
            };
            return fail_track_named(ctx, &self.source, &metadata, None, &e).await;
        }

        ctx.events.publish(
            TrackEvent::new(&metadata.id, &metadata.title, &metadata.artist, TrackStatus::Found)
                .into(),
        );

        let folder = single_folder(ctx, &metadata);

        // Byte handle and artwork resolve concurrently; both must land
        // before the track is considered resolved.
        let (downloadable, cover) = tokio::join!(
            client.get_downloadable(&self.id),
            resolve_artwork(ctx, &metadata, &folder),
        );

        let downloadable = match downloadable {
            Ok(downloadable) => downloadable,
            Err(e) => {
                return fail_track_named(ctx, &self.source, &metadata, None, &e).await;
            }
        };

        let cover_path = cover.unwrap_or_else(|e| {
            tracing::warn!(track_id = %metadata.id, error = %e, "artwork unavailable, continuing without");
            None
        });

        Ok(Resolution::Resolved(Track {
            metadata,
            downloadable,
            cover_path,
            playlist_id: None,
            source: self.source.clone(),
            folder,
        }))
    }
}

impl PendingPlaylistTrack {
    /// Resolve a playlist member, applying the configured metadata
    /// transforms (position renumbering, album override)
    pub async fn resolve(&self, ctx: &SessionContext) -> Result<Resolution<Track>> {
        if ctx.db.is_completed(&self.id).await? {
            tracing::info!(track_id = %self.id, playlist_id = %self.playlist_id, "already downloaded, skipping");
            return Ok(Resolution::Skipped);
        }

        let playlist_id = Some(self.playlist_id.clone());

        let client = match ctx.client(&self.source) {
            Ok(client) => client,
            Err(e) => {
                return fail_track(ctx, &self.source, &self.id, playlist_id, &e).await;
            }
        };

        let mut metadata = match client.get_track_metadata(&self.id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return fail_track(ctx, &self.source, &self.id, playlist_id, &e).await;
            }
        };

        if !metadata.streamable {
            let e = Error::NotStreamable {
                id: self.id.clone(),
                source_name: self.source.clone(),
                reason: "source reports track as not streamable".to_string(),
            };
            return fail_track_named(ctx, &self.source, &metadata, playlist_id, &e).await;
        }

        if ctx.config.metadata.renumber_playlist_tracks {
            metadata.track_number = self.position;
        }
        if ctx.config.metadata.set_playlist_to_album {
            metadata.album = self.playlist_name.clone();
        }

        ctx.events.publish(
            TrackEvent::new(&metadata.id, &metadata.title, &metadata.artist, TrackStatus::Found)
                .with_playlist(playlist_id.clone())
                .into(),
        );

        let folder = ctx
            .config
            .download
            .download_dir
            .join(sanitize_filename(&self.playlist_name));

        let (downloadable, cover) = tokio::join!(
            client.get_downloadable(&self.id),
            resolve_artwork(ctx, &metadata, &folder),
        );

        let downloadable = match downloadable {
            Ok(downloadable) => downloadable,
            Err(e) => {
                return fail_track_named(ctx, &self.source, &metadata, playlist_id, &e).await;
            }
        };

        let cover_path = cover.unwrap_or_else(|e| {
            tracing::warn!(track_id = %metadata.id, error = %e, "artwork unavailable, continuing without");
            None
        });

        Ok(Resolution::Resolved(Track {
            metadata,
            downloadable,
            cover_path,
            playlist_id,
            source: self.source.clone(),
            folder,
        }))
    }
}

/// Target directory for a standalone track
fn single_folder(ctx: &SessionContext, metadata: &TrackMetadata) -> PathBuf {
    let mut folder = ctx.config.download.download_dir.clone();

    if ctx.config.download.add_singles_to_folder {
        folder = folder.join(sanitize_filename(&format!(
            "{} - {}",
            metadata.artist, metadata.album
        )));
    }

    if ctx.config.download.disc_subdirectories && metadata.disc_total > 1 {
        folder = folder.join(format!("Disc {}", metadata.disc_number));
    }

    folder
}

/// Resolve cover art through the cache, asking the fetcher at most once
/// per track (negative results are cached too)
async fn resolve_artwork(
    ctx: &SessionContext,
    metadata: &TrackMetadata,
    dir: &std::path::Path,
) -> Result<Option<PathBuf>> {
    let cached = match ctx.db.cover_for_track(&metadata.id).await? {
        Some(record) => Some(record),
        None => ctx.db.cover_by_metadata(&metadata.artist, &metadata.title).await?,
    };

    let cover_url = match cached {
        Some(record) => record.cover_url,
        None => {
            let url = match metadata.cover_url.clone() {
                Some(url) => Some(url),
                None => ctx.artwork.cover_url(metadata).await?,
            };
            ctx.db
                .store_cover(&metadata.id, &metadata.artist, &metadata.title, url.as_deref())
                .await?;
            url
        }
    };

    match cover_url {
        Some(url) => Ok(Some(ctx.artwork.download(&url, dir).await?)),
        None => Ok(None),
    }
}

/// Record and announce a resolution failure for a track whose metadata
/// never arrived (title/artist unknown)
///
/// The terminal event goes out before the ledger write: observers must
/// see a terminal state even if the write fails afterwards.
async fn fail_track<T>(
    ctx: &SessionContext,
    source: &str,
    track_id: &str,
    playlist_id: Option<String>,
    error: &Error,
) -> Result<Resolution<T>> {
    tracing::warn!(track_id = %track_id, source = %source, error = %error, "track resolution failed");
    ctx.events.publish(
        TrackEvent::new(track_id, "Unknown", "Unknown", TrackStatus::Failed)
            .with_playlist(playlist_id)
            .with_error(error.to_string())
            .into(),
    );
    ctx.db.mark_failed(source, "track", track_id).await?;
    Ok(Resolution::Failed)
}

/// Record and announce a resolution failure once metadata is known
///
/// Terminal event first, ledger write second, as in [`fail_track`].
async fn fail_track_named<T>(
    ctx: &SessionContext,
    source: &str,
    metadata: &TrackMetadata,
    playlist_id: Option<String>,
    error: &Error,
) -> Result<Resolution<T>> {
    tracing::warn!(track_id = %metadata.id, source = %source, error = %error, "track resolution failed");
    ctx.events.publish(
        TrackEvent::new(&metadata.id, &metadata.title, &metadata.artist, TrackStatus::Failed)
            .with_playlist(playlist_id)
            .with_error(error.to_string())
            .into(),
    );
    ctx.db.mark_failed(source, "track", &metadata.id).await?;
    Ok(Resolution::Failed)
}
