//! Track records shared between the radio engine and its listeners
//!
//! A `Track` is an immutable snapshot of one catalog song as it looked at the
//! last playlist load. Only `counters` is ever patched in place (after a vote
//! or play-count bump) and only on the copy the scheduler holds as current.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable popularity counters attached to a track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCounters {
    pub play_count: u64,
    pub up_vote_count: u64,
    pub radio_play_count: u64,
    pub radio_vote_count: u64,
}

/// One playable track of the active playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stable catalog identifier
    pub id: String,
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub image_url: String,
    /// Always > 0 (normalized on load)
    pub duration_secs: f64,
    /// Prompt text the track was generated from
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Display name of the submitting user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub counters: TrackCounters,
}

/// Current-state snapshot: the playing track plus how far into it we are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    #[serde(flatten)]
    pub track: Track,
    /// Seconds since the track started
    pub elapsed: f64,
    pub started_at: DateTime<Utc>,
}

impl NowPlaying {
    /// Seconds left before the track ends (never negative)
    pub fn remaining(&self) -> f64 {
        (self.track.duration_secs - self.elapsed).max(0.0)
    }
}
