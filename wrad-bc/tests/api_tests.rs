//! Integration tests for the wrad-bc HTTP surface
//!
//! The router is driven in-process with `oneshot`; the scheduler runs over
//! an in-memory catalog.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use wrad_bc::catalog::{CatalogTrack, InMemoryCatalog};
use wrad_bc::config::RadioSettings;
use wrad_bc::{build_router, AppState, RadioScheduler};
use wrad_common::TrackCounters;

fn song(id: &str, secs: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        title: format!("Song {}", id),
        artist: "Tester".to_string(),
        duration: Some(secs.to_string()),
        ..Default::default()
    }
}

/// Scheduler over a two-track catalog, already playing
async fn setup_playing() -> (Arc<InMemoryCatalog>, Arc<RadioScheduler>) {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog
        .set_playlist("radio", vec![song("a", "300"), song("b", "240")])
        .await;
    let scheduler = RadioScheduler::new(catalog.clone(), RadioSettings::default());
    scheduler.reload().await;
    (catalog, scheduler)
}

fn setup_idle() -> Arc<RadioScheduler> {
    RadioScheduler::new(Arc::new(InMemoryCatalog::new()), RadioSettings::default())
}

fn app(scheduler: &Arc<RadioScheduler>) -> axum::Router {
    build_router(AppState::new(Arc::clone(scheduler)))
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health and build info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(&setup_idle())
        .oneshot(request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wrad-bc");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let response = app(&setup_idle())
        .oneshot(request("GET", "/api/buildinfo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["module"], "wrad-bc");
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

// =============================================================================
// Now playing / up next / skip
// =============================================================================

#[tokio::test]
async fn test_now_playing() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("GET", "/radio/now-playing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], "a");
    assert_eq!(body["durationSecs"], 300.0);
    assert!(body["elapsed"].as_f64().unwrap() >= 0.0);
    assert!(body["startedAt"].is_string());
}

#[tokio::test]
async fn test_now_playing_without_tracks_is_404() {
    let response = app(&setup_idle())
        .oneshot(request("GET", "/radio/now-playing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No tracks available");
}

#[tokio::test]
async fn test_up_next() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("GET", "/radio/up-next"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["id"], "b");
}

#[tokio::test]
async fn test_skip_advances() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("POST", "/radio/skip"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], "b");
    assert_eq!(body["elapsed"], 0.0);

    let now = scheduler.current_state_snapshot().await.unwrap();
    assert_eq!(now.track.id, "b");
}

#[tokio::test]
async fn test_skip_without_tracks_is_404() {
    let response = app(&setup_idle())
        .oneshot(request("POST", "/radio/skip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_skip_requires_post() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("GET", "/radio/skip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Counters and status
// =============================================================================

#[tokio::test]
async fn test_refresh_counters() {
    let (catalog, scheduler) = setup_playing().await;
    catalog
        .set_counters(
            "a",
            TrackCounters {
                play_count: 9,
                radio_vote_count: 2,
                ..Default::default()
            },
        )
        .await;

    let response = app(&scheduler)
        .oneshot(request("POST", "/radio/counters/refresh"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["refreshed"], true);
    assert_eq!(body["counters"]["playCount"], 9);
    assert_eq!(body["counters"]["radioVoteCount"], 2);
}

#[tokio::test]
async fn test_refresh_counters_catalog_down_is_503() {
    let (catalog, scheduler) = setup_playing().await;
    catalog.set_unavailable(true);

    let response = app(&scheduler)
        .oneshot(request("POST", "/radio/counters/refresh"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_status() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("GET", "/radio/status"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["phase"], "playing");
    assert_eq!(body["playlist"], "radio");
    assert_eq!(body["trackCount"], 2);
    assert_eq!(body["playedInCycle"], 1);
    assert_eq!(body["subscribers"], 0);
    assert!(body["wakeupInSecs"].as_f64().unwrap() > 300.0);
    assert!(body["lastReloadAt"].is_string());
}

#[tokio::test]
async fn test_status_idle() {
    let response = app(&setup_idle())
        .oneshot(request("GET", "/radio/status"))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["phase"], "idle");
    assert!(body["wakeupInSecs"].is_null());
    assert!(body["lastReloadAt"].is_null());
}

// =============================================================================
// Live events (SSE)
// =============================================================================

async fn next_chunk(body: &mut Body) -> String {
    loop {
        let frame = body
            .frame()
            .await
            .expect("stream ended")
            .expect("body error");
        if let Ok(data) = frame.into_data() {
            return String::from_utf8(data.to_vec()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_event_stream_starts_with_connected_and_snapshot() {
    let (_catalog, scheduler) = setup_playing().await;
    let response = app(&scheduler)
        .oneshot(request("GET", "/radio/events"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(scheduler.status().await.subscribers, 1);

    let mut body = response.into_body();
    let connected = next_chunk(&mut body).await;
    assert!(connected.contains(r#""type":"connected""#), "{}", connected);

    let snapshot = next_chunk(&mut body).await;
    assert!(snapshot.contains(r#""type":"snapshot""#), "{}", snapshot);
    assert!(snapshot.contains(r#""upNext""#), "{}", snapshot);

    scheduler.force_advance().await;
    let change = next_chunk(&mut body).await;
    assert!(change.contains(r#""type":"track-change""#), "{}", change);
    assert!(change.contains(r#""previousTrack""#), "{}", change);

    // Dropping the response body disconnects the listener
    drop(body);
    assert_eq!(scheduler.status().await.subscribers, 0);
}
