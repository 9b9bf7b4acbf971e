//! Download execution layer and the main [`PlaylistDownloader`] type
//!
//! ## Submodules
//!
//! - [`track`] — single-track transfer with the concurrency gate and
//!   one automatic retry
//! - [`orchestrator`] — playlist batches processed in fixed-size waves
//! - [`tasks`] — supervised background submissions with cancellation

pub mod orchestrator;
pub mod tasks;
pub mod track;

pub use orchestrator::{WAVE_SIZE, download_playlist};
pub use tasks::SubmissionRegistry;
pub use track::DownloadOutcome;

use crate::client::{ArtworkFetcher, MetadataClient, PlaylistScraper, PostProcessor};
use crate::config::Config;
use crate::context::SessionContext;
use crate::db::Database;
use crate::error::Result;
use crate::events::{BusCounts, EventBus, Observer};
use crate::media::{PendingExternalPlaylist, PendingItem, Resolution, ResolvedMedia};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// External implementations injected into a [`PlaylistDownloader`]
pub struct Collaborators {
    /// Streaming-service clients; at least one is required for downloads
    pub clients: Vec<Arc<dyn MetadataClient>>,
    /// External playlist page scraper, if scraped playlists are wanted
    pub scraper: Option<Arc<dyn PlaylistScraper>>,
    /// Cover art fetcher
    pub artwork: Arc<dyn ArtworkFetcher>,
    /// Tagger/transcoder applied after each transfer
    pub post_processor: Arc<dyn PostProcessor>,
}

/// The main downloader: owns the database, the event bus, and the
/// background submission registry
pub struct PlaylistDownloader {
    ctx: Arc<SessionContext>,
    bus: Arc<EventBus>,
    submissions: SubmissionRegistry,
}

impl PlaylistDownloader {
    /// Create a downloader from validated configuration
    ///
    /// Opens (and migrates) the database. Configuration errors are fatal
    /// here; per-item errors during later downloads never are.
    pub async fn new(config: Config, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(Database::new(&config.database_path).await?);
        let bus = Arc::new(EventBus::new());
        let max_concurrent = config.download.max_concurrent_downloads;

        let clients: HashMap<String, Arc<dyn MetadataClient>> = collaborators
            .clients
            .into_iter()
            .map(|client| (client.source().to_string(), client))
            .collect();

        tracing::info!(
            clients = clients.len(),
            max_concurrent,
            database = %config.database_path.display(),
            "downloader initialized"
        );

        let ctx = Arc::new(SessionContext {
            db,
            events: bus.clone(),
            config: Arc::new(config),
            clients,
            scraper: collaborators.scraper,
            artwork: collaborators.artwork,
            post_processor: collaborators.post_processor,
            download_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        });

        Ok(Self {
            ctx,
            bus,
            submissions: SubmissionRegistry::new(),
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.ctx.config
    }

    /// The shared pipeline context
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }

    /// Resolve and download one pending item to completion
    ///
    /// Per-item failures are recorded and announced through the bus;
    /// `Err` is reserved for infrastructure failures.
    pub async fn download(&self, item: PendingItem) -> Result<()> {
        match item.resolve(&self.ctx).await? {
            Resolution::Resolved(ResolvedMedia::Track(track)) => {
                track.download(&self.ctx).await?;
            }
            Resolution::Resolved(ResolvedMedia::Playlist(playlist)) => {
                download_playlist(&self.ctx, playlist).await?;
            }
            Resolution::Skipped | Resolution::Failed => {}
        }
        Ok(())
    }

    /// Submit an external playlist URL as a background task
    ///
    /// Validates the source names up front, then resolves and downloads
    /// in a supervised task. Returns the generated task id.
    pub fn submit_external_playlist(
        &self,
        url: Url,
        source: Option<String>,
        fallback_source: Option<String>,
    ) -> Result<String> {
        // Reject unknown source names before spawning anything
        if let Some(source) = source.as_deref() {
            self.ctx.client(source)?;
        }
        if let Some(fallback) = fallback_source.as_deref() {
            self.ctx.client(fallback)?;
        }
        if source.is_none() {
            self.ctx.primary_client()?;
        }

        let ctx = self.ctx.clone();
        let pending = PendingExternalPlaylist {
            url,
            source,
            fallback_source,
        };

        let task_id = self.submissions.spawn(async move {
            match pending.resolve(&ctx).await {
                Ok(Resolution::Resolved(playlist)) => {
                    if let Err(e) = download_playlist(&ctx, playlist).await {
                        tracing::error!(error = %e, "playlist download aborted");
                    }
                }
                Ok(Resolution::Skipped | Resolution::Failed) => {}
                Err(e) => {
                    tracing::error!(error = %e, "playlist resolution aborted");
                }
            }
        });

        Ok(task_id)
    }

    /// Subscribe to progress events (snapshot first, then live)
    pub fn subscribe(&self) -> Observer {
        self.bus.subscribe()
    }

    /// Retained-state counts for health/status endpoints
    pub fn counts(&self) -> BusCounts {
        self.bus.counts()
    }

    /// Ids of background submissions currently in flight
    pub fn active_tasks(&self) -> Vec<String> {
        self.submissions.active()
    }

    /// Cancel a background submission; `false` if unknown or finished
    pub fn cancel_task(&self, task_id: &str) -> bool {
        self.submissions.cancel(task_id)
    }
}

#[cfg(test)]
pub(crate) mod test_helpers;
