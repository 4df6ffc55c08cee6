//! Error types for wrad-bc
//!
//! Only the edges of the service (startup, catalog adapters, HTTP) produce
//! these. The scheduling core reports outcomes as plain enums instead and
//! never fails outward.

use thiserror::Error;

/// Main error type for the radio broadcast service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog database query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog source unreachable or returned unusable data
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Active playlist does not exist or has no playable tracks
    #[error("Playlist '{0}' has no playable tracks")]
    EmptyPlaylist(String),

    /// A catalog record that cannot be turned into a track
    #[error("Invalid track: {0}")]
    InvalidTrack(String),
}

/// Convenience Result type using wrad-bc Error
pub type Result<T> = std::result::Result<T, Error>;
