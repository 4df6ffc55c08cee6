//! Event types pushed to live radio listeners
//!
//! Events are produced by the radio scheduler, fanned out by the broadcast
//! hub and serialized for SSE transmission. Every event is tagged by `type`
//! (kebab-case) so listeners can dispatch on a single field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::track::{Track, TrackCounters};

/// WRAD listener event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RadioEvent {
    /// First frame on every new subscription (no payload)
    Connected,

    /// Catch-up frame sent right after `Connected` when a track is playing
    ///
    /// Lets a late joiner position its player without waiting for the next
    /// natural transition.
    Snapshot {
        track: Track,
        /// Seconds into `track` at subscribe time
        elapsed: f64,
        started_at: DateTime<Utc>,
        /// Track that will play next, if any
        up_next: Option<Track>,
    },

    /// The scheduler moved to a new track
    ///
    /// Emitted on natural wake-up, forced skip and on a playlist reload that
    /// restarts rotation. `elapsed` is always 0.
    TrackChange {
        track: Track,
        previous_track: Option<Track>,
        elapsed: f64,
        started_at: DateTime<Utc>,
        up_next: Option<Track>,
    },

    /// Fresh counters for the current track; playback position untouched
    CountersUpdate {
        track_id: String,
        counters: TrackCounters,
        elapsed: f64,
    },

    /// Same track, updated elapsed (drift correction)
    Heartbeat { track_id: String, elapsed: f64 },
}

impl RadioEvent {
    /// Event kind string, used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            RadioEvent::Connected => "connected",
            RadioEvent::Snapshot { .. } => "snapshot",
            RadioEvent::TrackChange { .. } => "track-change",
            RadioEvent::CountersUpdate { .. } => "counters-update",
            RadioEvent::Heartbeat { .. } => "heartbeat",
        }
    }

    /// Identifier of the track this event is about (None for `Connected`)
    pub fn track_id(&self) -> Option<&str> {
        match self {
            RadioEvent::Connected => None,
            RadioEvent::Snapshot { track, .. } | RadioEvent::TrackChange { track, .. } => {
                Some(track.id.as_str())
            }
            RadioEvent::CountersUpdate { track_id, .. } | RadioEvent::Heartbeat { track_id, .. } => {
                Some(track_id.as_str())
            }
        }
    }
}
