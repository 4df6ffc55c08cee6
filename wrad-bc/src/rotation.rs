//! Rotation policy: which track plays next
//!
//! Every track of a snapshot plays exactly once per cycle; once the played
//! set covers the whole snapshot a new cycle starts at index 0. Pure: the
//! caller applies the decision (including clearing the played set).

use std::collections::HashSet;

use crate::playlist::PlaylistSnapshot;

/// Next-track decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Continue the current cycle at this index
    Continue(usize),
    /// Cycle exhausted: clear the played set and play this index (always 0)
    NewCycle(usize),
}

impl Rotation {
    pub fn index(self) -> usize {
        match self {
            Rotation::Continue(index) | Rotation::NewCycle(index) => index,
        }
    }

    pub fn starts_new_cycle(self) -> bool {
        matches!(self, Rotation::NewCycle(_))
    }
}

/// Select the next track index
///
/// Walks forward circularly from `current_index + 1` (or from 0 when nothing
/// is current) and returns the first unplayed track. Returns `None` only for
/// an empty snapshot. A single-track snapshot replays the same track every
/// cycle.
pub fn next_index(
    snapshot: &PlaylistSnapshot,
    played: &HashSet<String>,
    current_index: Option<usize>,
) -> Option<Rotation> {
    let len = snapshot.len();
    if len == 0 {
        return None;
    }

    let tracks = snapshot.tracks();
    if tracks.iter().all(|track| played.contains(&track.id)) {
        return Some(Rotation::NewCycle(0));
    }

    let start = current_index.map_or(0, |index| (index + 1) % len);
    let pick = (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&index| !played.contains(&tracks[index].id))
        .map_or(Rotation::NewCycle(0), Rotation::Continue);
    Some(pick)
}

/// True when at most one track of the snapshot is still unplayed
///
/// The scheduler uses this to refresh the playlist right before a cycle
/// wraps, so the next cycle starts from current catalog data.
pub fn cycle_nearly_complete(snapshot: &PlaylistSnapshot, played: &HashSet<String>) -> bool {
    let unplayed = snapshot
        .tracks()
        .iter()
        .filter(|track| !played.contains(&track.id))
        .count();
    unplayed <= 1
}
