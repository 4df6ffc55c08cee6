//! # WRAD Common Library
//!
//! Shared code for the WRAD radio services and their listener clients:
//! - Track and counter records (the catalog-facing data model)
//! - Wire event types pushed to live listeners (RadioEvent enum)
//! - Bootstrap configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod track;

pub use error::{Error, Result};
pub use events::RadioEvent;
pub use track::{NowPlaying, Track, TrackCounters};
