//! Completed/failed download ledger.
//!
//! Re-runs consult this ledger before fetching any metadata: a completed
//! id is skipped outright. All inserts are `INSERT OR IGNORE`, so two
//! concurrent tasks recording the same id never produce an error.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::Database;

impl Database {
    /// Check whether a track id has already been downloaded
    pub async fn is_completed(&self, id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM downloads WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to query downloads: {}",
                    e
                )))
            })?;

        Ok(count > 0)
    }

    /// Record a track id as downloaded
    ///
    /// Duplicate inserts are silently ignored.
    pub async fn mark_completed(&self, id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO downloads (id) VALUES (?)")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to record completed download: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Record a permanently failed item
    ///
    /// Duplicate inserts are silently ignored.
    pub async fn mark_failed(&self, source: &str, media_type: &str, id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO failed_downloads (source, media_type, id) VALUES (?, ?, ?)")
            .bind(source)
            .bind(media_type)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to record failed download: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Check whether an item is recorded as permanently failed
    pub async fn is_failed(&self, id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM failed_downloads WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to query failed_downloads: {}",
                    e
                )))
            })?;

        Ok(count > 0)
    }
}
