//! Playlist cache: the only component that polls the catalog
//!
//! `load()` performs the catalog I/O and produces a fully-formed snapshot.
//! It never touches playback state; the scheduler applies the result under
//! its own lock, using [`classify`] to decide whether rotation restarts.

mod normalize;
mod snapshot;

pub use normalize::{build_track, normalize_duration};
pub use snapshot::{Fingerprint, PlaylistSnapshot};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::PlaylistSource;
use crate::error::{Error, Result};

/// What a freshly loaded snapshot means for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadDecision {
    /// Track set changed (or nothing is playing): reset the cycle, start at index 0
    Restart,
    /// Same track set while playing: swap the snapshot, keep position and identity
    Refresh,
}

/// Decide how a new snapshot is applied
pub fn classify(
    previous: &PlaylistSnapshot,
    next: &PlaylistSnapshot,
    is_playing: bool,
) -> ReloadDecision {
    if previous.fingerprint() != next.fingerprint() || !is_playing {
        ReloadDecision::Restart
    } else {
        ReloadDecision::Refresh
    }
}

/// Loader for the active playlist
pub struct PlaylistCache {
    source: Arc<dyn PlaylistSource>,
    playlist_name: String,
    fallback_duration_secs: f64,
}

impl PlaylistCache {
    pub fn new(
        source: Arc<dyn PlaylistSource>,
        playlist_name: impl Into<String>,
        fallback_duration_secs: f64,
    ) -> Self {
        Self {
            source,
            playlist_name: playlist_name.into(),
            fallback_duration_secs,
        }
    }

    pub fn playlist_name(&self) -> &str {
        &self.playlist_name
    }

    pub fn source(&self) -> &Arc<dyn PlaylistSource> {
        &self.source
    }

    /// Fetch and normalize the active playlist
    ///
    /// Unresolvable and id-less entries are skipped with a warning. Returns
    /// `Error::EmptyPlaylist` when nothing playable remains, so callers can
    /// treat "empty" and "unreachable" alike: keep the previous snapshot.
    pub async fn load(&self) -> Result<PlaylistSnapshot> {
        let entries = self.source.fetch_playlist(&self.playlist_name).await?;
        let total = entries.len();

        let mut tracks = Vec::with_capacity(total);
        for (position, entry) in entries.into_iter().enumerate() {
            let Some(entry) = entry else {
                warn!(
                    "Playlist '{}' slot {} references a missing track, skipping",
                    self.playlist_name, position
                );
                continue;
            };
            match build_track(entry, self.fallback_duration_secs) {
                Ok(track) => tracks.push(track),
                Err(e) => warn!(
                    "Playlist '{}' slot {}: {}, skipping",
                    self.playlist_name, position, e
                ),
            }
        }

        if tracks.is_empty() {
            return Err(Error::EmptyPlaylist(self.playlist_name.clone()));
        }

        debug!(
            "Loaded {}/{} tracks from {} playlist '{}'",
            tracks.len(),
            total,
            self.source.source_id(),
            self.playlist_name
        );
        Ok(PlaylistSnapshot::new(tracks))
    }
}
