//! Configuration for wrad-bc
//!
//! Bootstrap settings come from the TOML file (see `wrad_common::config`);
//! command-line arguments and `WRAD_*` environment variables are applied on
//! top by `main.rs`. Every field has a compiled default so a missing file
//! still yields a working service.
//!
//! ```toml
//! port = 5760
//! database_path = "/var/lib/wrad/catalog.db"
//!
//! [logging]
//! level = "info"
//!
//! [radio]
//! playlist_name = "radio"
//! reload_interval_secs = 30
//! heartbeat_interval_secs = 10
//! fallback_duration_secs = 120.0
//! wake_grace_secs = 1.0
//! subscriber_buffer = 64
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use wrad_common::config::LoggingConfig;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server port
    pub port: u16,

    /// Path to the SQLite catalog database
    pub database_path: PathBuf,

    pub logging: LoggingConfig,

    pub radio: RadioSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5760,
            database_path: PathBuf::from("catalog.db"),
            logging: LoggingConfig::default(),
            radio: RadioSettings::default(),
        }
    }
}

impl Config {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        self.radio.validate()
    }
}

/// Scheduler and broadcast tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioSettings {
    /// Name of the playlist the radio rotates through
    pub playlist_name: String,

    /// Catalog poll cadence
    pub reload_interval_secs: u64,

    /// Drift-correction heartbeat cadence
    pub heartbeat_interval_secs: u64,

    /// Duration substituted for tracks with a missing/invalid duration
    pub fallback_duration_secs: f64,

    /// Added to every wake-up delay so transitions never fire early
    pub wake_grace_secs: f64,

    /// Per-subscriber event buffer; a subscriber that falls this far behind is dropped
    pub subscriber_buffer: usize,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            playlist_name: "radio".to_string(),
            reload_interval_secs: 30,
            heartbeat_interval_secs: 10,
            fallback_duration_secs: 120.0,
            wake_grace_secs: 1.0,
            subscriber_buffer: 64,
        }
    }
}

impl RadioSettings {
    /// Reload period, never shorter than one second
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs.max(1))
    }

    /// Heartbeat period, never shorter than one second
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.playlist_name.trim().is_empty() {
            return Err(Error::Config("radio.playlist_name must not be empty".to_string()));
        }
        if self.reload_interval_secs == 0 {
            return Err(Error::Config("radio.reload_interval_secs must be > 0".to_string()));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(Error::Config("radio.heartbeat_interval_secs must be > 0".to_string()));
        }
        if !self.fallback_duration_secs.is_finite() || self.fallback_duration_secs <= 0.0 {
            return Err(Error::Config(format!(
                "radio.fallback_duration_secs must be a positive number, got {}",
                self.fallback_duration_secs
            )));
        }
        if !self.wake_grace_secs.is_finite() || self.wake_grace_secs < 0.0 {
            return Err(Error::Config(format!(
                "radio.wake_grace_secs must be >= 0, got {}",
                self.wake_grace_secs
            )));
        }
        // Room for the connected frame plus the catch-up snapshot
        if self.subscriber_buffer < 2 {
            return Err(Error::Config("radio.subscriber_buffer must be >= 2".to_string()));
        }
        Ok(())
    }
}
