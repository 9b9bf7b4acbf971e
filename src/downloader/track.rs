//! Gated track transfer.
//!
//! A transfer holds one permit of the process-wide semaphore for its
//! whole lifetime, retry included, so "N concurrent downloads" means N
//! tracks in flight regardless of how many are retrying. The permit is
//! released before post-processing: tagging is local CPU/disk work and
//! must not starve the transfer pipeline.

use crate::client::ProgressCallback;
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::media::Track;
use crate::types::{TrackEvent, TrackStatus};
use crate::utils::sanitize_filename;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Terminal result of one track download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Transferred, post-processed, and recorded in the ledger
    Completed,
    /// Failed after the retry (or in post-processing); recorded as failed
    Failed,
}

impl Track {
    /// Transfer this track with at most one automatic retry
    ///
    /// Always publishes a terminal event for the track. `Err` is
    /// reserved for infrastructure failures (ledger writes); transfer
    /// and post-processing failures return [`DownloadOutcome::Failed`].
    pub async fn download(self, ctx: &SessionContext) -> Result<DownloadOutcome> {
        let permit = ctx
            .download_semaphore
            .acquire()
            .await
            .map_err(|_| Error::Other("download semaphore closed".to_string()))?;

        let track_id = self.metadata.id.clone();
        tracing::info!(
            track_id = %track_id,
            title = %self.metadata.title,
            artist = %self.metadata.artist,
            "starting download"
        );

        let path = match self.transfer(ctx).await {
            Ok(path) => path,
            Err(first_error) => {
                tracing::warn!(track_id = %track_id, error = %first_error, "download failed, retrying");
                // Transient failure event; the retry overwrites it
                ctx.events.publish(
                    self.event(TrackStatus::Failed)
                        .with_error(format!("download error, retrying: {first_error}"))
                        .into(),
                );

                match self.transfer(ctx).await {
                    Ok(path) => path,
                    Err(retry_error) => {
                        drop(permit);
                        tracing::error!(track_id = %track_id, error = %retry_error, "download failed after retry");
                        // Terminal event before the ledger write: the
                        // stream must reach a terminal state even if the
                        // write fails afterwards
                        ctx.events.publish(
                            self.event(TrackStatus::Failed)
                                .with_error(retry_error.to_string())
                                .into(),
                        );
                        ctx.db.mark_failed(&self.source, "track", &track_id).await?;
                        return Ok(DownloadOutcome::Failed);
                    }
                }
            }
        };

        // Transfer done; free the slot before local post-processing
        drop(permit);

        if let Err(e) = ctx
            .post_processor
            .process(&path, &self.metadata, self.cover_path.as_deref())
            .await
        {
            tracing::error!(track_id = %track_id, error = %e, "post-processing failed");
            ctx.events.publish(
                self.event(TrackStatus::Failed)
                    .with_error(e.to_string())
                    .into(),
            );
            ctx.db.mark_failed(&self.source, "track", &track_id).await?;
            return Ok(DownloadOutcome::Failed);
        }

        ctx.events
            .publish(self.event(TrackStatus::Completed).with_progress(100.0).into());
        ctx.db.mark_completed(&track_id).await?;
        tracing::info!(track_id = %track_id, path = %path.display(), "download complete");

        Ok(DownloadOutcome::Completed)
    }

    /// One transfer attempt: stream the bytes, publishing a running
    /// percentage per chunk
    async fn transfer(&self, ctx: &SessionContext) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.folder).await?;

        let filename = sanitize_filename(&format!(
            "{:02} - {} - {}",
            self.metadata.track_number, self.metadata.artist, self.metadata.title
        ));
        let path = self
            .folder
            .join(format!("{filename}.{}", self.downloadable.extension()));

        let size = self.downloadable.size().await?;
        let transferred = Arc::new(AtomicU64::new(0));

        let events = ctx.events.clone();
        let template = self.event(TrackStatus::Downloading);
        let callback: ProgressCallback = Arc::new(move |chunk| {
            let total = transferred.fetch_add(chunk, Ordering::Relaxed) + chunk;
            let progress = match size {
                Some(size) if size > 0 => (total as f64 / size as f64) * 100.0,
                _ => 0.0,
            };
            events.publish(template.clone().with_progress(progress).into());
        });

        self.downloadable.download(&path, callback).await?;
        Ok(path)
    }

    /// Event pre-filled with this track's identity
    fn event(&self, status: TrackStatus) -> TrackEvent {
        TrackEvent::new(
            &self.metadata.id,
            &self.metadata.title,
            &self.metadata.artist,
            status,
        )
        .with_playlist(self.playlist_id.clone())
    }
}
