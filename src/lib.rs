//! # playlist-dl
//!
//! Backend library for playlist download applications: resolves
//! playlist/track references against streaming-service clients,
//! downloads them under bounded concurrency with automatic retry, and
//! publishes live progress over an in-process event bus with an SSE
//! surface.
//!
//! ## Design Philosophy
//!
//! playlist-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Idempotent** - A persistent ledger makes re-runs skip finished work
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//! - **Transport-agnostic** - Streaming protocols live behind trait seams
//!
//! ## Quick Start
//!
//! ```no_run
//! use playlist_dl::{Collaborators, Config, PlaylistDownloader};
//! use playlist_dl::client::{NoOpArtworkFetcher, NoOpPostProcessor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collaborators = Collaborators {
//!         clients: vec![/* your MetadataClient implementations */],
//!         scraper: None,
//!         artwork: Arc::new(NoOpArtworkFetcher),
//!         post_processor: Arc::new(NoOpPostProcessor),
//!     };
//!     let downloader = PlaylistDownloader::new(Config::default(), collaborators).await?;
//!
//!     // Subscribe to progress events
//!     let observer = downloader.subscribe();
//!     tokio::spawn(async move {
//!         use tokio_stream::StreamExt;
//!         let mut stream = Box::pin(observer.into_stream());
//!         while let Some(event) = stream.next().await {
//!             println!("{}: {:?}", event.event_type(), event);
//!         }
//!     });
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Collaborator trait seams (clients, scraper, artwork, post-processing)
pub mod client;
/// Configuration types
pub mod config;
/// Shared pipeline context
pub mod context;
/// Database persistence layer
pub mod db;
/// Download execution (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Progress event bus
pub mod events;
/// Media resolution layer
pub mod media;
/// Core event types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use context::SessionContext;
pub use db::Database;
pub use downloader::{Collaborators, PlaylistDownloader};
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use events::{EventBus, NoOpProgress, Observer, ProgressSink};
pub use types::{
    ConnectionEvent, PlaylistEvent, PlaylistStatus, ProgressEvent, SearchEvent, TrackEvent,
    TrackStatus,
};
