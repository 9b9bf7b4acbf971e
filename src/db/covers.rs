//! Cover art URL cache.
//!
//! Stores one row per track, keyed by track id with a secondary
//! case-insensitive (artist, title) lookup for search-resolved tracks. A
//! row with a NULL `cover_url` is a cached negative result: the source
//! was asked once and reported no art, so we never ask again.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{CoverRecord, Database};

impl Database {
    /// Look up a cached cover by track id
    pub async fn cover_for_track(&self, track_id: &str) -> Result<Option<CoverRecord>> {
        let record = sqlx::query_as::<_, CoverRecord>(
            "SELECT track_id, artist, title, cover_url FROM covers WHERE track_id = ?",
        )
        .bind(track_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to query covers by track id: {}",
                e
            )))
        })?;

        Ok(record)
    }

    /// Look up a cached cover by artist and title, case-insensitively
    pub async fn cover_by_metadata(&self, artist: &str, title: &str) -> Result<Option<CoverRecord>> {
        let record = sqlx::query_as::<_, CoverRecord>(
            r#"
            SELECT track_id, artist, title, cover_url FROM covers
            WHERE artist = ? COLLATE NOCASE AND title = ? COLLATE NOCASE
            "#,
        )
        .bind(artist)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to query covers by metadata: {}",
                e
            )))
        })?;

        Ok(record)
    }

    /// Cache a cover lookup result, replacing any previous row for the track
    ///
    /// Pass `None` to cache the fact that the track has no cover art.
    pub async fn store_cover(
        &self,
        track_id: &str,
        artist: &str,
        title: &str,
        cover_url: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO covers (track_id, artist, title, cover_url) VALUES (?, ?, ?, ?)",
        )
        .bind(track_id)
        .bind(artist)
        .bind(title)
        .bind(cover_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to store cover: {}",
                e
            )))
        })?;

        Ok(())
    }
}
