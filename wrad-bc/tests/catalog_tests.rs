//! SQLite catalog end to end: a catalog file on disk, opened read-only,
//! driving the scheduler

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wrad_bc::catalog::{PlaylistSource, SqliteCatalog};
use wrad_bc::config::RadioSettings;
use wrad_bc::scheduler::{CounterRefresh, ReloadOutcome};
use wrad_bc::RadioScheduler;

/// Writable pool used only to seed the catalog file
async fn seed_pool(path: &Path) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    SqliteCatalog::ensure_schema(&pool).await.unwrap();
    pool
}

async fn insert_song(pool: &SqlitePool, id: &str, duration: Option<&str>, play_count: i64) {
    sqlx::query(
        "INSERT INTO songs (id, title, artist, audio_url, image_url, duration, username, play_count)
         VALUES (?, ?, 'Tester', ?, '', ?, 'ada', ?)",
    )
    .bind(id)
    .bind(format!("Song {}", id))
    .bind(format!("https://cdn.test/{}.mp3", id))
    .bind(duration)
    .bind(play_count)
    .execute(pool)
    .await
    .unwrap();
}

async fn add_to_playlist(pool: &SqlitePool, playlist: &str, song_id: &str, position: i64) {
    sqlx::query("INSERT OR IGNORE INTO playlists (id, name) VALUES (?, ?)")
        .bind(format!("pl-{}", playlist))
        .bind(playlist)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO playlist_tracks (playlist_id, song_id, position) VALUES (?, ?, ?)")
        .bind(format!("pl-{}", playlist))
        .bind(song_id)
        .bind(position)
        .execute(pool)
        .await
        .unwrap();
}

/// Catalog file with playlist "radio" = [b, (deleted song), a, c]
async fn setup_catalog() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");
    let pool = seed_pool(&path).await;

    insert_song(&pool, "a", Some("180"), 4).await;
    insert_song(&pool, "b", Some("95.5"), 0).await;
    insert_song(&pool, "c", Some("not-a-number"), 1).await;

    add_to_playlist(&pool, "radio", "a", 2).await;
    add_to_playlist(&pool, "radio", "b", 0).await;
    add_to_playlist(&pool, "radio", "deleted", 1).await;
    add_to_playlist(&pool, "radio", "c", 3).await;

    (dir, pool)
}

#[tokio::test]
async fn test_fetch_playlist_in_position_order() {
    let (dir, _seed) = setup_catalog().await;
    let catalog = SqliteCatalog::connect_readonly(&dir.path().join("catalog.db"))
        .await
        .unwrap();

    let entries = catalog.fetch_playlist("radio").await.unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].as_ref().map(|e| e.id.as_str()), Some("b"));
    assert!(entries[1].is_none(), "deleted song must surface as None");
    assert_eq!(entries[2].as_ref().map(|e| e.id.as_str()), Some("a"));

    let a = entries[2].as_ref().unwrap();
    assert_eq!(a.duration.as_deref(), Some("180"));
    assert_eq!(a.submitted_by.as_deref(), Some("ada"));
    assert_eq!(a.counters.play_count, 4);

    assert!(catalog.fetch_playlist("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_readonly_connection_rejects_writes() {
    let (dir, _seed) = setup_catalog().await;
    let catalog = SqliteCatalog::connect_readonly(&dir.path().join("catalog.db"))
        .await
        .unwrap();

    let result = sqlx::query("DELETE FROM songs")
        .execute(catalog.pool())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_scheduler_over_sqlite_catalog() {
    let (dir, seed) = setup_catalog().await;
    let catalog = SqliteCatalog::connect_readonly(&dir.path().join("catalog.db"))
        .await
        .unwrap();
    let scheduler = RadioScheduler::new(Arc::new(catalog), RadioSettings::default());

    assert_eq!(
        scheduler.reload().await,
        ReloadOutcome::Restarted {
            track_id: "b".to_string()
        }
    );
    let status = scheduler.status().await;
    assert_eq!(status.track_count, 3);

    let now = scheduler.current_state_snapshot().await.unwrap();
    assert_eq!(now.track.duration_secs, 95.5);

    // c's unparsable duration falls back to the configured default
    scheduler.force_advance().await;
    let c = scheduler.force_advance().await.unwrap();
    assert_eq!(c.track.id, "c");
    assert_eq!(c.track.duration_secs, 120.0);

    // A vote lands in the catalog; the radio picks it up on request
    sqlx::query("UPDATE songs SET up_vote_count = 5 WHERE id = 'c'")
        .execute(&seed)
        .await
        .unwrap();
    match scheduler.refresh_current_track_counters().await {
        CounterRefresh::Updated { counters } => {
            assert_eq!(counters.up_vote_count, 5);
            assert_eq!(counters.play_count, 1);
        }
        other => panic!("expected updated counters, got {:?}", other),
    }
}
