//! wrad-bc library - Radio broadcast engine
//!
//! Rotates through the active playlist on wall-clock time and pushes
//! "now playing" to live listeners. The HTTP layer in [`api`] is a thin
//! shell over [`scheduler::RadioScheduler`].

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hub;
pub mod playlist;
pub mod rotation;
pub mod scheduler;

pub use error::{Error, Result};
pub use scheduler::RadioScheduler;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<RadioScheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<RadioScheduler>) -> Self {
        Self { scheduler }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let radio = Router::new()
        .route("/radio/now-playing", get(api::now_playing))
        .route("/radio/up-next", get(api::up_next))
        .route("/radio/skip", post(api::skip))
        .route("/radio/counters/refresh", post(api::refresh_counters))
        .route("/radio/status", get(api::status))
        .route("/radio/events", get(api::event_stream));

    Router::new()
        .merge(radio)
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
