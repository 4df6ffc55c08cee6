//! Immutable playlist snapshots

use chrono::{DateTime, Utc};
use wrad_common::Track;

/// Content fingerprint of a snapshot: the ordered id list
///
/// Two snapshots with the same fingerprint hold the same tracks in the same
/// order; counters and display fields may still differ.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(Vec<String>);

impl Fingerprint {
    pub fn of(tracks: &[Track]) -> Self {
        Self(tracks.iter().map(|t| t.id.clone()).collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

/// One load of the active playlist
///
/// Replaced wholesale on every successful reload and shared by `Arc`, so
/// readers never observe a half-built list.
#[derive(Debug, Clone)]
pub struct PlaylistSnapshot {
    tracks: Vec<Track>,
    fingerprint: Fingerprint,
    loaded_at: DateTime<Utc>,
}

impl PlaylistSnapshot {
    pub fn new(tracks: Vec<Track>) -> Self {
        let fingerprint = Fingerprint::of(&tracks);
        Self {
            tracks,
            fingerprint,
            loaded_at: wrad_common::time::now(),
        }
    }

    /// The snapshot the scheduler starts with, before the first load
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Index of the first track with this id
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    pub fn contains_id(&self, track_id: &str) -> bool {
        self.position_of(track_id).is_some()
    }

    pub fn find(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrad_common::TrackCounters;

    fn track(id: &str, play_count: u64) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: String::new(),
            audio_url: String::new(),
            image_url: String::new(),
            duration_secs: 60.0,
            prompt: String::new(),
            genre: None,
            submitted_by: None,
            counters: TrackCounters {
                play_count,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_fingerprint_ignores_counters() {
        let first = PlaylistSnapshot::new(vec![track("a", 1), track("b", 1)]);
        let second = PlaylistSnapshot::new(vec![track("a", 50), track("b", 7)]);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let first = PlaylistSnapshot::new(vec![track("a", 0), track("b", 0)]);
        let reordered = PlaylistSnapshot::new(vec![track("b", 0), track("a", 0)]);
        assert_ne!(first.fingerprint(), reordered.fingerprint());
    }

    #[test]
    fn test_lookup_helpers() {
        let snapshot = PlaylistSnapshot::new(vec![track("a", 0), track("b", 0)]);
        assert_eq!(snapshot.position_of("b"), Some(1));
        assert!(snapshot.contains_id("a"));
        assert!(!snapshot.contains_id("z"));
        assert_eq!(snapshot.find("b").map(|t| t.id.as_str()), Some("b"));
        assert_eq!(snapshot.fingerprint().ids(), ["a", "b"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = PlaylistSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.get(0).is_none());
    }
}
