//! Catalog sources: where the active playlist's tracks come from
//!
//! The surrounding application owns songs, playlists and votes. The radio
//! engine only ever reads from it through [`PlaylistSource`], and only the
//! playlist cache and the counter refresher call it.

use async_trait::async_trait;
use wrad_common::TrackCounters;

use crate::error::Result;

mod memory;
mod sqlite;

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;

/// Raw catalog record, before duration normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub image_url: String,
    /// Duration in seconds as stored by the catalog (may be missing or garbage)
    pub duration: Option<String>,
    pub prompt: String,
    pub genre: Option<String>,
    pub submitted_by: Option<String>,
    pub counters: TrackCounters,
}

/// Read-only view of the song catalog
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Short name for logs (e.g., "sqlite", "memory")
    fn source_id(&self) -> &'static str;

    /// Fetch the ordered entries of a playlist by name
    ///
    /// A `None` entry is a playlist slot whose song can no longer be resolved.
    /// An unknown playlist yields an empty list, not an error.
    ///
    /// # Returns
    /// * `Ok(entries)` - Playlist entries in play order
    /// * `Err(_)` - Transient failure; the caller keeps its previous snapshot
    async fn fetch_playlist(&self, name: &str) -> Result<Vec<Option<CatalogTrack>>>;

    /// Fetch the current counters of one track
    ///
    /// Returns `Ok(None)` if the track no longer exists.
    async fn fetch_track_counters(&self, track_id: &str) -> Result<Option<TrackCounters>>;
}
