//! Database layer for playlist-dl
//!
//! Handles SQLite persistence for the idempotency ledger and the cover
//! art cache.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`downloads`] — Completed/failed download ledger
//! - [`covers`] — Cover art URL cache (with negative caching)

use sqlx::{FromRow, sqlite::SqlitePool};

mod covers;
mod downloads;
mod migrations;

/// Cached cover art lookup for a track
///
/// `cover_url` is `None` when a previous lookup found no art; the row's
/// existence distinguishes "known to have no cover" from "never looked up".
#[derive(Debug, Clone, FromRow)]
pub struct CoverRecord {
    /// Source-scoped track id
    pub track_id: String,
    /// Track artist at the time of caching
    pub artist: String,
    /// Track title at the time of caching
    pub title: String,
    /// Cover URL, or NULL for a cached negative result
    pub cover_url: Option<String>,
}

/// Database handle for playlist-dl
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
