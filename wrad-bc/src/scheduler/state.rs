//! Playback state owned by the scheduler
//!
//! Plain data, mutated only while the scheduler's state lock is held.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::time::Instant;
use wrad_common::{NowPlaying, Track};

use crate::playlist::PlaylistSnapshot;

/// The track on air
#[derive(Debug, Clone)]
pub struct CurrentTrack {
    pub track: Track,
    /// Wall-clock start, reported to listeners
    pub started_at: DateTime<Utc>,
    /// Monotonic start, used for elapsed/remaining arithmetic
    pub started_instant: Instant,
}

impl CurrentTrack {
    /// Seconds since the track started
    pub fn elapsed_secs(&self) -> f64 {
        self.started_instant.elapsed().as_secs_f64()
    }

    /// Seconds until the track's nominal end (never negative)
    pub fn remaining_secs(&self) -> f64 {
        (self.track.duration_secs - self.elapsed_secs()).max(0.0)
    }

    pub fn now_playing(&self) -> NowPlaying {
        NowPlaying {
            track: self.track.clone(),
            elapsed: wrad_common::time::round_secs(self.elapsed_secs()),
            started_at: self.started_at,
        }
    }
}

/// Position within the rotation
#[derive(Debug, Default)]
pub struct PlaybackState {
    pub current: Option<CurrentTrack>,
    pub previous: Option<Track>,
    /// Ids played in the current cycle (includes the current track)
    pub played: HashSet<String>,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.track.id.as_str())
    }

    /// Put `track` on air
    ///
    /// The outgoing track becomes `previous`; the new track joins the played
    /// set. Returns the outgoing track.
    pub fn start(&mut self, track: Track) -> Option<Track> {
        self.played.insert(track.id.clone());
        let outgoing = self.current.take().map(|c| c.track);
        self.previous = outgoing.clone();
        self.current = Some(CurrentTrack {
            track,
            started_at: wrad_common::time::now(),
            started_instant: Instant::now(),
        });
        outgoing
    }

    /// Stop playing; the outgoing track becomes `previous`
    pub fn go_idle(&mut self) {
        if let Some(outgoing) = self.current.take() {
            self.previous = Some(outgoing.track);
        }
    }

    pub fn clear_played(&mut self) {
        self.played.clear();
    }

    /// Drop played ids that the snapshot no longer contains
    pub fn purge_missing(&mut self, snapshot: &PlaylistSnapshot) {
        self.played.retain(|id| snapshot.contains_id(id));
    }

    /// Tracks of `snapshot` not yet played this cycle
    pub fn unplayed_count(&self, snapshot: &PlaylistSnapshot) -> usize {
        snapshot
            .tracks()
            .iter()
            .filter(|t| !self.played.contains(&t.id))
            .count()
    }

    /// Played-set size restricted to the snapshot
    pub fn played_in_cycle(&self, snapshot: &PlaylistSnapshot) -> usize {
        snapshot.len() - self.unplayed_count(snapshot)
    }
}
