//! Catalog record validation
//!
//! Turns raw catalog records into tracks. Kept apart from rotation so each
//! rule can be tested on its own. One bad record must never stall the
//! rotation: durations fall back, unusable records are skipped.

use wrad_common::Track;

use crate::catalog::CatalogTrack;
use crate::error::{Error, Result};

/// Parse a catalog duration, substituting `fallback` for missing,
/// unparsable, non-finite or non-positive values
pub fn normalize_duration(raw: Option<&str>, fallback: f64) -> f64 {
    raw.map(str::trim)
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .unwrap_or(fallback)
}

/// Build a track from a catalog record
///
/// Fails only when the record has no usable identifier; every other defect
/// is repaired.
pub fn build_track(entry: CatalogTrack, fallback_duration: f64) -> Result<Track> {
    let id = entry.id.trim().to_string();
    if id.is_empty() {
        return Err(Error::InvalidTrack(format!(
            "record '{}' has no identifier",
            entry.title
        )));
    }

    let duration_secs = normalize_duration(entry.duration.as_deref(), fallback_duration);

    Ok(Track {
        id,
        title: entry.title,
        artist: entry.artist,
        audio_url: entry.audio_url,
        image_url: entry.image_url,
        duration_secs,
        prompt: entry.prompt,
        genre: entry.genre,
        submitted_by: entry.submitted_by,
        counters: entry.counters,
    })
}
