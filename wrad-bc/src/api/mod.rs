//! HTTP API handlers for wrad-bc

pub mod buildinfo;
pub mod error;
pub mod health;
pub mod radio;
pub mod sse;

pub use buildinfo::get_build_info;
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use radio::{now_playing, refresh_counters, skip, status, up_next};
pub use sse::event_stream;
