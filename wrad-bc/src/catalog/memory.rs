//! In-process catalog
//!
//! Holds playlists in memory. Used when embedding the engine without a
//! database and as the controllable source in tests (outage switch, fetch
//! counter).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use wrad_common::TrackCounters;

use super::{CatalogTrack, PlaylistSource};
use crate::error::{Error, Result};

/// Mutable in-memory playlist source
#[derive(Default)]
pub struct InMemoryCatalog {
    playlists: RwLock<HashMap<String, Vec<Option<CatalogTrack>>>>,
    unavailable: AtomicBool,
    playlist_fetches: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a playlist with fully resolved tracks
    pub async fn set_playlist(&self, name: &str, tracks: Vec<CatalogTrack>) {
        self.set_entries(name, tracks.into_iter().map(Some).collect())
            .await;
    }

    /// Replace a playlist, including unresolvable (`None`) slots
    pub async fn set_entries(&self, name: &str, entries: Vec<Option<CatalogTrack>>) {
        self.playlists
            .write()
            .await
            .insert(name.to_string(), entries);
    }

    /// Overwrite the counters of every copy of a track, in every playlist
    ///
    /// Returns false if the track is not in any playlist.
    pub async fn set_counters(&self, track_id: &str, counters: TrackCounters) -> bool {
        let mut playlists = self.playlists.write().await;
        let mut found = false;
        for entry in playlists.values_mut().flatten().flatten() {
            if entry.id == track_id {
                entry.counters = counters;
                found = true;
            }
        }
        found
    }

    /// Simulate a catalog outage: every fetch fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `fetch_playlist` calls served so far (including failed ones)
    pub fn playlist_fetches(&self) -> usize {
        self.playlist_fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Catalog("in-memory catalog marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaylistSource for InMemoryCatalog {
    fn source_id(&self) -> &'static str {
        "memory"
    }

    async fn fetch_playlist(&self, name: &str) -> Result<Vec<Option<CatalogTrack>>> {
        self.playlist_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .playlists
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_track_counters(&self, track_id: &str) -> Result<Option<TrackCounters>> {
        self.check_available()?;
        let playlists = self.playlists.read().await;
        Ok(playlists
            .values()
            .flatten()
            .flatten()
            .find(|entry| entry.id == track_id)
            .map(|entry| entry.counters))
    }
}
