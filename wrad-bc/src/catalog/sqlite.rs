//! SQLite catalog adapter
//!
//! Reads the application's song catalog. Expected tables:
//! - `playlists (id, name)`
//! - `playlist_tracks (playlist_id, song_id, position)`
//! - `songs (id, title, artist, audio_url, image_url, duration, prompt, genre,
//!   username, play_count, up_vote_count, radio_play_count, radio_vote_count)`
//!
//! `playlist_tracks` is LEFT JOINed with `songs`, so a slot pointing at a
//! deleted song comes back as a `None` entry instead of vanishing silently.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::debug;
use wrad_common::TrackCounters;

use super::{CatalogTrack, PlaylistSource};
use crate::error::{Error, Result};

/// Catalog tables, for development databases and tests
///
/// Production catalogs are created and migrated by the owning application.
pub const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    artist TEXT NOT NULL DEFAULT '',
    audio_url TEXT NOT NULL DEFAULT '',
    image_url TEXT NOT NULL DEFAULT '',
    duration,
    prompt TEXT NOT NULL DEFAULT '',
    genre TEXT,
    username TEXT,
    play_count INTEGER NOT NULL DEFAULT 0,
    up_vote_count INTEGER NOT NULL DEFAULT 0,
    radio_play_count INTEGER NOT NULL DEFAULT 0,
    radio_vote_count INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS playlists (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS playlist_tracks (
    playlist_id TEXT NOT NULL REFERENCES playlists(id),
    song_id TEXT NOT NULL,
    position INTEGER NOT NULL
);
"#;

/// Playlist source backed by the SQLite song catalog
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Wrap an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the catalog database read-only
    ///
    /// The radio never writes to the catalog; read-only mode makes that a
    /// property of the connection rather than of the code.
    pub async fn connect_readonly(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::Config(format!(
                "Catalog database not found: {}",
                db_path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the catalog tables if missing (development databases and tests)
    pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::raw_sql(CATALOG_SCHEMA).execute(pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn counter(row: &SqliteRow, column: &str) -> Result<u64> {
    let value: Option<i64> = row.try_get(column)?;
    Ok(value.unwrap_or(0).max(0) as u64)
}

fn counters_from_row(row: &SqliteRow) -> Result<TrackCounters> {
    Ok(TrackCounters {
        play_count: counter(row, "play_count")?,
        up_vote_count: counter(row, "up_vote_count")?,
        radio_play_count: counter(row, "radio_play_count")?,
        radio_vote_count: counter(row, "radio_vote_count")?,
    })
}

/// Map one joined row; `None` when the song side of the join is missing
fn entry_from_row(row: &SqliteRow) -> Result<Option<CatalogTrack>> {
    let Some(id) = row.try_get::<Option<String>, _>("id")? else {
        return Ok(None);
    };

    let text = |column: &str| -> Result<String> {
        Ok(row
            .try_get::<Option<String>, _>(column)?
            .unwrap_or_default())
    };

    Ok(Some(CatalogTrack {
        id,
        title: text("title")?,
        artist: text("artist")?,
        audio_url: text("audio_url")?,
        image_url: text("image_url")?,
        duration: row.try_get("duration")?,
        prompt: text("prompt")?,
        genre: row.try_get("genre")?,
        submitted_by: row.try_get("username")?,
        counters: counters_from_row(row)?,
    }))
}

#[async_trait]
impl PlaylistSource for SqliteCatalog {
    fn source_id(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_playlist(&self, name: &str) -> Result<Vec<Option<CatalogTrack>>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.title, s.artist, s.audio_url, s.image_url,
                   CAST(s.duration AS TEXT) AS duration,
                   s.prompt, s.genre, s.username,
                   s.play_count, s.up_vote_count, s.radio_play_count, s.radio_vote_count
            FROM playlists p
            JOIN playlist_tracks pt ON pt.playlist_id = p.id
            LEFT JOIN songs s ON s.id = pt.song_id
            WHERE p.name = ?
            ORDER BY pt.position ASC, pt.rowid ASC
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} entries for playlist '{}'", rows.len(), name);
        rows.iter().map(entry_from_row).collect()
    }

    async fn fetch_track_counters(&self, track_id: &str) -> Result<Option<TrackCounters>> {
        let row = sqlx::query(
            r#"
            SELECT play_count, up_vote_count, radio_play_count, radio_vote_count
            FROM songs
            WHERE id = ?
            "#,
        )
        .bind(track_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(counters_from_row).transpose()
    }
}
