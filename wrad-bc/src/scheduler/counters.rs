//! Counter refresh for the track on air
//!
//! Triggered by the surrounding application after a vote or play-count
//! bump. Touches only `counters`: start time, played set and the pending
//! wake-up stay as they are.

use serde::Serialize;
use tracing::{debug, warn};
use wrad_common::{RadioEvent, TrackCounters};

use super::RadioScheduler;

/// Result of `refresh_current_track_counters()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum CounterRefresh {
    /// Counters replaced and `counters-update` broadcast
    Updated { counters: TrackCounters },
    /// Nothing is playing
    NoCurrentTrack,
    /// The track changed while counters were fetched; result discarded
    TrackChanged,
    /// Source failed or no longer knows the track
    Unavailable,
}

impl RadioScheduler {
    /// Re-pull counters for the current track and rebroadcast them
    pub async fn refresh_current_track_counters(&self) -> CounterRefresh {
        let on_air = {
            let state = self.state.lock().await;
            state.playback.current_id().map(str::to_string)
        };
        let Some(track_id) = on_air else {
            return CounterRefresh::NoCurrentTrack;
        };

        // Fetched outside the lock
        let counters = match self.cache.source().fetch_track_counters(&track_id).await {
            Ok(Some(counters)) => counters,
            Ok(None) => {
                warn!("Track {} vanished from the catalog, counters kept", track_id);
                return CounterRefresh::Unavailable;
            }
            Err(e) => {
                warn!("Counter refresh for {} failed: {}", track_id, e);
                return CounterRefresh::Unavailable;
            }
        };

        let mut state = self.state.lock().await;
        let Some(current) = state.playback.current.as_mut() else {
            return CounterRefresh::NoCurrentTrack;
        };
        if current.track.id != track_id {
            debug!(
                "Discarding counters for {}: '{}' is now on air",
                track_id, current.track.id
            );
            return CounterRefresh::TrackChanged;
        }

        current.track.counters = counters;
        let elapsed = wrad_common::time::round_secs(current.elapsed_secs());
        self.hub.broadcast(RadioEvent::CountersUpdate {
            track_id,
            counters,
            elapsed,
        });
        CounterRefresh::Updated { counters }
    }
}
