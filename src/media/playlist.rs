//! Playlist resolution.
//!
//! A source playlist expands into pending tracks via one metadata call.
//! An external playlist is scraped into (title, artist) pairs, each
//! searched on the primary source with an optional fallback; search
//! progress is announced per pair so a UI can render it live.

use crate::context::SessionContext;
use crate::error::Result;
use crate::media::{PendingPlaylistTrack, Resolution};
use crate::types::{PlaylistEvent, PlaylistStatus, SearchEvent};
use url::Url;

/// A playlist on a streaming source
#[derive(Debug, Clone)]
pub struct PendingPlaylist {
    /// Source-scoped playlist id
    pub id: String,
    /// Streaming source name
    pub source: String,
}

/// A playlist scraped from an external page
#[derive(Debug, Clone)]
pub struct PendingExternalPlaylist {
    /// Page URL to scrape
    pub url: Url,
    /// Source searched for each scraped pair; `None` uses the configured
    /// primary
    pub source: Option<String>,
    /// Source tried when the first search finds nothing; `None` uses the
    /// configured fallback
    pub fallback_source: Option<String>,
}

/// A resolved playlist: identity plus the pending tracks to download
pub struct Playlist {
    /// Playlist id (source id, or generated for scraped playlists)
    pub id: String,
    /// Display name
    pub name: String,
    /// Pending members in playlist order
    pub tracks: Vec<PendingPlaylistTrack>,
}

impl PendingPlaylist {
    /// Fetch playlist metadata and expand into pending tracks
    pub async fn resolve(&self, ctx: &SessionContext) -> Result<Resolution<Playlist>> {
        let client = match ctx.client(&self.source) {
            Ok(client) => client,
            Err(e) => {
                return fail_playlist(ctx, &self.source, &self.id, "playlist", &e.to_string()).await;
            }
        };

        let metadata = match client.get_playlist_metadata(&self.id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return fail_playlist(ctx, &self.source, &self.id, "playlist", &e.to_string()).await;
            }
        };

        let tracks = metadata
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| PendingPlaylistTrack {
                id: track.id.clone(),
                source: self.source.clone(),
                playlist_id: metadata.id.clone(),
                playlist_name: metadata.name.clone(),
                position: index as u32 + 1,
            })
            .collect();

        Ok(Resolution::Resolved(Playlist {
            id: metadata.id,
            name: metadata.name,
            tracks,
        }))
    }
}

impl PendingExternalPlaylist {
    /// Scrape the page and search every (title, artist) pair
    ///
    /// One [`SearchEvent`] is published per pair, carrying running
    /// found/failed totals; a pair with no match on any source is
    /// counted and skipped, never aborting the rest.
    pub async fn resolve(&self, ctx: &SessionContext) -> Result<Resolution<Playlist>> {
        let playlist_id = uuid::Uuid::new_v4().to_string();

        let primary = match &self.source {
            Some(source) => ctx.client(source),
            None => ctx.primary_client(),
        };
        let primary = match primary {
            Ok(client) => client,
            Err(e) => {
                return fail_playlist(ctx, "external", self.url.as_str(), "playlist", &e.to_string())
                    .await;
            }
        };
        let fallback = match &self.fallback_source {
            Some(source) => ctx.client(source).ok(),
            None => ctx.fallback_client(),
        };

        let Some(scraper) = ctx.scraper.as_ref() else {
            return fail_playlist(
                ctx,
                "external",
                self.url.as_str(),
                "playlist",
                "no playlist scraper configured",
            )
            .await;
        };

        let scraped = match scraper.scrape(&self.url).await {
            Ok(scraped) => scraped,
            Err(e) => {
                return fail_playlist(ctx, "external", self.url.as_str(), "playlist", &e.to_string())
                    .await;
            }
        };

        tracing::info!(
            playlist_id = %playlist_id,
            name = %scraped.name,
            entries = scraped.entries.len(),
            "scraped external playlist"
        );
        ctx.events.publish(
            PlaylistEvent::new(
                &playlist_id,
                &scraped.name,
                PlaylistStatus::Resolving,
                scraped.entries.len(),
            )
            .into(),
        );

        let mut tracks = Vec::with_capacity(scraped.entries.len());
        let mut found = 0usize;
        let mut failed = 0usize;

        for entry in &scraped.entries {
            let query = format!("{} - {}", entry.artist, entry.title);

            let mut hit = None;
            let mut hit_source = primary.source().to_string();

            match primary.search(&query, 1).await {
                Ok(results) if !results.is_empty() => {
                    hit = results.into_iter().next();
                }
                Ok(_) => {
                    if let Some(fallback) = &fallback {
                        match fallback.search(&query, 1).await {
                            Ok(results) if !results.is_empty() => {
                                hit = results.into_iter().next();
                                hit_source = fallback.source().to_string();
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::warn!(query = %query, error = %e, "fallback search failed");
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "search failed");
                }
            }

            match hit {
                Some(result) => {
                    found += 1;
                    tracks.push(PendingPlaylistTrack {
                        id: result.id,
                        source: hit_source,
                        playlist_id: playlist_id.clone(),
                        playlist_name: scraped.name.clone(),
                        position: found as u32,
                    });
                }
                None => {
                    failed += 1;
                    tracing::warn!(query = %query, "no match on any source");
                }
            }

            let mut search_event = SearchEvent::new(&playlist_id, &query, scraped.entries.len());
            search_event.found = found;
            search_event.failed = failed;
            ctx.events.publish(search_event.into());
        }

        Ok(Resolution::Resolved(Playlist {
            id: playlist_id,
            name: scraped.name,
            tracks,
        }))
    }
}

/// Record and announce a playlist-level resolution failure
///
/// The terminal event goes out before the ledger write: observers must
/// see a terminal state even if the write fails afterwards.
async fn fail_playlist<T>(
    ctx: &SessionContext,
    source: &str,
    id: &str,
    media_type: &str,
    reason: &str,
) -> Result<Resolution<T>> {
    tracing::warn!(playlist = %id, source = %source, reason = %reason, "playlist resolution failed");
    ctx.events
        .publish(PlaylistEvent::new(id, "Unknown", PlaylistStatus::Failed, 0).into());
    ctx.db.mark_failed(source, media_type, id).await?;
    Ok(Resolution::Failed)
}
