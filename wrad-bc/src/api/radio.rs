//! Radio endpoints
//!
//! Each handler is one call into the scheduler; "no tracks" becomes 404.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use wrad_common::{NowPlaying, Track, TrackCounters};

use super::error::{no_tracks, ApiError, ApiResult};
use crate::scheduler::{CounterRefresh, SchedulerStatus};
use crate::AppState;

/// GET /radio/now-playing
pub async fn now_playing(State(state): State<AppState>) -> ApiResult<Json<NowPlaying>> {
    state
        .scheduler
        .current_state_snapshot()
        .await
        .map(Json)
        .ok_or_else(no_tracks)
}

/// GET /radio/up-next
pub async fn up_next(State(state): State<AppState>) -> ApiResult<Json<Track>> {
    state
        .scheduler
        .upcoming_track()
        .await
        .map(Json)
        .ok_or_else(no_tracks)
}

/// POST /radio/skip
///
/// Forced advance; returns the track that is now on air.
pub async fn skip(State(state): State<AppState>) -> ApiResult<Json<NowPlaying>> {
    info!("Skip requested over HTTP");
    state
        .scheduler
        .force_advance()
        .await
        .map(Json)
        .ok_or_else(no_tracks)
}

/// Body of a successful counter refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountersResponse {
    pub refreshed: bool,
    pub counters: Option<TrackCounters>,
}

/// POST /radio/counters/refresh
///
/// Called by the surrounding application after a vote or play-count bump.
/// A track change racing the refresh is not an error: the new track was
/// loaded with fresh counters anyway.
pub async fn refresh_counters(State(state): State<AppState>) -> ApiResult<Json<CountersResponse>> {
    match state.scheduler.refresh_current_track_counters().await {
        CounterRefresh::Updated { counters } => Ok(Json(CountersResponse {
            refreshed: true,
            counters: Some(counters),
        })),
        CounterRefresh::TrackChanged => Ok(Json(CountersResponse {
            refreshed: false,
            counters: None,
        })),
        CounterRefresh::NoCurrentTrack => Err(no_tracks()),
        CounterRefresh::Unavailable => Err(ApiError::Unavailable(
            "Counters could not be fetched from the catalog".to_string(),
        )),
    }
}

/// GET /radio/status
pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status().await)
}
