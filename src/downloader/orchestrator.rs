//! Playlist batch orchestration.
//!
//! Tracks are processed in consecutive waves of [`WAVE_SIZE`]; within a
//! wave everything runs concurrently (still subject to the transfer
//! semaphore), and a wave must finish before the next starts. Dropping
//! the returned future cancels the in-flight wave with it.

use crate::context::SessionContext;
use crate::downloader::track::DownloadOutcome;
use crate::error::Result;
use crate::media::{PendingPlaylistTrack, Playlist, Resolution};
use crate::types::{PlaylistEvent, PlaylistStatus};
use futures::future::join_all;

/// Tracks processed concurrently per wave
pub const WAVE_SIZE: usize = 20;

enum TrackOutcome {
    Completed,
    Failed,
    Skipped,
}

/// Download every track of a resolved playlist
///
/// Publishes the opening `downloading` aggregate, processes the waves,
/// and always ends with a terminal playlist event: `completed` even for
/// partial success, `failed` only when nothing at all succeeded.
pub async fn download_playlist(ctx: &SessionContext, playlist: Playlist) -> Result<()> {
    let total = playlist.tracks.len();
    tracing::info!(
        playlist_id = %playlist.id,
        name = %playlist.name,
        total_tracks = total,
        "starting playlist download"
    );

    ctx.events.publish(
        PlaylistEvent::new(&playlist.id, &playlist.name, PlaylistStatus::Downloading, total)
            .into(),
    );

    let mut completed = 0usize;
    let mut failed = 0usize;

    for wave in playlist.tracks.chunks(WAVE_SIZE) {
        let outcomes = join_all(wave.iter().map(|pending| process_track(ctx, pending))).await;

        for outcome in outcomes {
            match outcome {
                // A skipped track is already on disk from a previous run
                TrackOutcome::Completed | TrackOutcome::Skipped => completed += 1,
                TrackOutcome::Failed => failed += 1,
            }
        }
    }

    let status = if total > 0 && completed == 0 && failed > 0 {
        PlaylistStatus::Failed
    } else {
        PlaylistStatus::Completed
    };

    let mut terminal = PlaylistEvent::new(&playlist.id, &playlist.name, status, total);
    terminal.found_tracks = completed;
    terminal.completed_tracks = completed;
    terminal.failed_tracks = failed;
    ctx.events.publish(terminal.into());

    tracing::info!(
        playlist_id = %playlist.id,
        completed,
        failed,
        status = ?status,
        "playlist download finished"
    );

    Ok(())
}

/// Resolve then download one playlist member, absorbing its errors so
/// siblings in the wave are unaffected
async fn process_track(ctx: &SessionContext, pending: &PendingPlaylistTrack) -> TrackOutcome {
    match pending.resolve(ctx).await {
        Ok(Resolution::Resolved(track)) => match track.download(ctx).await {
            Ok(DownloadOutcome::Completed) => TrackOutcome::Completed,
            Ok(DownloadOutcome::Failed) => TrackOutcome::Failed,
            Err(e) => {
                tracing::error!(track_id = %pending.id, error = %e, "download aborted");
                TrackOutcome::Failed
            }
        },
        Ok(Resolution::Skipped) => TrackOutcome::Skipped,
        Ok(Resolution::Failed) => TrackOutcome::Failed,
        Err(e) => {
            tracing::error!(track_id = %pending.id, error = %e, "resolution aborted");
            TrackOutcome::Failed
        }
    }
}
