//! Shared pipeline context.
//!
//! Everything a resolution or download task needs is injected through
//! [`SessionContext`] rather than reached through globals: the
//! idempotency database, the progress sink, configuration, the client
//! registry, and the process-wide transfer semaphore.

use crate::client::{ArtworkFetcher, MetadataClient, PlaylistScraper, PostProcessor};
use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::events::ProgressSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Dependencies shared by every task in a downloader instance
pub struct SessionContext {
    /// Idempotency ledger and cover cache
    pub db: Arc<Database>,
    /// Progress sink (live bus or no-op)
    pub events: Arc<dyn ProgressSink>,
    /// Validated configuration
    pub config: Arc<Config>,
    /// Streaming-service clients keyed by source name
    pub clients: HashMap<String, Arc<dyn MetadataClient>>,
    /// External playlist page scraper, when configured
    pub scraper: Option<Arc<dyn PlaylistScraper>>,
    /// Cover art fetcher
    pub artwork: Arc<dyn ArtworkFetcher>,
    /// Tagger/transcoder applied after each transfer
    pub post_processor: Arc<dyn PostProcessor>,
    /// Process-wide transfer concurrency gate
    pub download_semaphore: Arc<Semaphore>,
}

impl SessionContext {
    /// Look up a client by source name
    pub fn client(&self, source: &str) -> Result<Arc<dyn MetadataClient>> {
        self.clients
            .get(source)
            .cloned()
            .ok_or_else(|| Error::InvalidRequest(format!("unknown source '{source}'")))
    }

    /// The client searched first for scraped playlists
    pub fn primary_client(&self) -> Result<Arc<dyn MetadataClient>> {
        self.client(&self.config.search.primary_source)
    }

    /// The client tried when the primary search returns nothing
    pub fn fallback_client(&self) -> Option<Arc<dyn MetadataClient>> {
        self.config
            .search
            .fallback_source
            .as_deref()
            .and_then(|source| self.clients.get(source).cloned())
    }
}
