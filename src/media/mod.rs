//! Media resolution layer
//!
//! A [`PendingItem`] is a reference to something the user asked for; a
//! resolved item owns everything needed to transfer bytes. Resolution is
//! where the idempotency ledger short-circuits work, where metadata and
//! artwork are fetched, and where playlists expand into their tracks.
//!
//! ## Submodules
//!
//! - [`track`] — single and playlist-member track resolution
//! - [`playlist`] — source playlists and scraped external playlists

mod playlist;
mod track;

pub use playlist::{PendingExternalPlaylist, PendingPlaylist, Playlist};
pub use track::{PendingPlaylistTrack, PendingSingle, Track};

use crate::context::SessionContext;
use crate::error::Result;

/// Outcome of resolving one pending item
///
/// Per-item problems surface as [`Resolution::Failed`] (already recorded
/// and announced by the resolver); `Err` is reserved for infrastructure
/// failures such as a broken database.
pub enum Resolution<T> {
    /// Ready to download
    Resolved(T),
    /// Already completed on a previous run; nothing to do
    Skipped,
    /// Could not be resolved; failure recorded and announced
    Failed,
}

// Manual impl: resolved payloads (byte-stream handles) are not Debug
impl<T> std::fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Resolved(_) => write!(f, "Resolved(..)"),
            Resolution::Skipped => write!(f, "Skipped"),
            Resolution::Failed => write!(f, "Failed"),
        }
    }
}

impl<T> Resolution<T> {
    /// Map the resolved value, preserving Skipped/Failed
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Skipped => Resolution::Skipped,
            Resolution::Failed => Resolution::Failed,
        }
    }
}

/// A downloadable thing produced by resolution
pub enum ResolvedMedia {
    /// One track, standalone or a playlist member
    Track(Box<Track>),
    /// A playlist expanded into pending tracks
    Playlist(Playlist),
}

/// A user-submitted reference awaiting resolution
pub enum PendingItem {
    /// One track requested on its own
    Single(PendingSingle),
    /// One track inside a playlist batch
    PlaylistTrack(PendingPlaylistTrack),
    /// A playlist on a streaming source
    Playlist(PendingPlaylist),
    /// A playlist scraped from an external page
    ExternalPlaylist(PendingExternalPlaylist),
}

impl PendingItem {
    /// Resolve this reference into downloadable media
    pub async fn resolve(&self, ctx: &SessionContext) -> Result<Resolution<ResolvedMedia>> {
        match self {
            PendingItem::Single(single) => Ok(single
                .resolve(ctx)
                .await?
                .map(|track| ResolvedMedia::Track(Box::new(track)))),
            PendingItem::PlaylistTrack(member) => Ok(member
                .resolve(ctx)
                .await?
                .map(|track| ResolvedMedia::Track(Box::new(track)))),
            PendingItem::Playlist(playlist) => {
                Ok(playlist.resolve(ctx).await?.map(ResolvedMedia::Playlist))
            }
            PendingItem::ExternalPlaylist(external) => {
                Ok(external.resolve(ctx).await?.map(ResolvedMedia::Playlist))
            }
        }
    }
}
