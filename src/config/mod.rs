//! Configuration for the flashback engine.
//!
//! Settings live in a TOML file with three sections:
//! - `[buffer]`: retention target, margin and session thresholds
//! - `[navigation]`: marker spacing and rapid-press windows
//! - `[replay]`: end-of-session detection tuning
//!
//! Every section is `#[serde(default)]`, so partial files load cleanly and
//! `migrate_config` can fill in whatever is missing.

mod migrate;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::FlashbackError;

pub use migrate::{migrate_config, MigrateResult};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "FLASHBACK_CONFIG";

/// Lower bound for `max_duration` (seconds).
pub const MIN_MAX_DURATION: f64 = 1.0;

/// Upper bound for `max_duration` (seconds).
pub const MAX_MAX_DURATION: f64 = 3600.0;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub buffer: BufferConfig,
    pub navigation: NavigationConfig,
    pub replay: ReplayConfig,
}

/// Retention and session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Seconds of captured media kept visible
    pub max_duration: f64,
    /// Extra seconds retained beyond `max_duration` for a decodable seek point
    pub buffer_margin: f64,
    /// Largest gap (seconds) for attaching a late fragment to the previous session
    pub late_chunk_threshold: f64,
    /// Sessions shorter than this are discarded on finalization
    pub min_session_duration: f64,
    /// Sessions with fewer payload bytes than this are discarded on finalization
    pub min_session_bytes: usize,
    /// Container type handed to the replay collaborator
    pub mime_type: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_duration: 30.0,
            buffer_margin: 10.0,
            late_chunk_threshold: 1.0,
            min_session_duration: 0.5,
            min_session_bytes: 1,
            mime_type: "video/webm".to_string(),
        }
    }
}

impl BufferConfig {
    /// Retention limit that triggers eviction.
    pub fn retention_limit(&self) -> f64 {
        self.max_duration + self.buffer_margin
    }
}

/// Seek and marker navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Minimum spacing between markers (seconds)
    pub marker_epsilon: f64,
    /// Presses closer together than this count as one burst (seconds)
    pub rapid_press_window: f64,
    /// Cap on the doubling exponent for step seeks
    pub max_step_exponent: u32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            marker_epsilon: 0.05,
            rapid_press_window: 0.5,
            max_step_exponent: 10,
        }
    }
}

/// End-of-session detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Added to the remaining visible duration for the absolute timeout
    pub timeout_margin: f64,
    /// Stall watchdog poll interval
    pub stall_poll_interval: f64,
    /// Playback that has not advanced for this long counts as stalled
    pub stall_window: f64,
    /// Minimum advance that resets the stall watchdog
    pub stall_min_progress: f64,
    /// Distance from the end at which playback is force-finished
    pub near_end_tolerance: f64,
    /// How long to wait for the recorder stop callback
    pub recorder_stop_timeout: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timeout_margin: 1.0,
            stall_poll_interval: 0.5,
            stall_window: 1.5,
            stall_min_progress: 0.1,
            near_end_tolerance: 0.2,
            recorder_stop_timeout: 2.0,
        }
    }
}

/// Clamp a retention target into the supported range.
pub fn clamp_max_duration(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.clamp(MIN_MAX_DURATION, MAX_MAX_DURATION)
    } else {
        BufferConfig::default().max_duration
    }
}

/// Clamp a buffer margin to a non-negative finite value.
pub fn clamp_buffer_margin(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        BufferConfig::default().buffer_margin
    }
}

impl Config {
    /// Return a copy with every value forced into its valid range.
    pub fn validated(mut self) -> Self {
        let defaults = Config::default();
        let b = &mut self.buffer;
        b.max_duration = clamp_max_duration(b.max_duration);
        b.buffer_margin = clamp_buffer_margin(b.buffer_margin);
        b.late_chunk_threshold =
            non_negative(b.late_chunk_threshold, defaults.buffer.late_chunk_threshold);
        b.min_session_duration =
            non_negative(b.min_session_duration, defaults.buffer.min_session_duration);

        let n = &mut self.navigation;
        n.marker_epsilon = non_negative(n.marker_epsilon, defaults.navigation.marker_epsilon);
        n.rapid_press_window =
            non_negative(n.rapid_press_window, defaults.navigation.rapid_press_window);
        n.max_step_exponent = n.max_step_exponent.min(30);

        let r = &mut self.replay;
        r.timeout_margin = non_negative(r.timeout_margin, defaults.replay.timeout_margin);
        r.stall_poll_interval =
            positive(r.stall_poll_interval, defaults.replay.stall_poll_interval);
        r.stall_window = positive(r.stall_window, defaults.replay.stall_window);
        r.stall_min_progress =
            non_negative(r.stall_min_progress, defaults.replay.stall_min_progress);
        r.near_end_tolerance =
            non_negative(r.near_end_tolerance, defaults.replay.near_end_tolerance);
        r.recorder_stop_timeout =
            positive(r.recorder_stop_timeout, defaults.replay.recorder_stop_timeout);
        self
    }

    /// Resolve the config file path.
    ///
    /// `$FLASHBACK_CONFIG` wins; otherwise `<config_dir>/flashback/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("flashback").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse and validate TOML content.
    ///
    /// # Errors
    /// `FlashbackError::InvalidConfig` when the content is not valid TOML
    /// or a value has the wrong type.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| FlashbackError::InvalidConfig(e.message().to_string()))?;
        Ok(config.validated())
    }

    /// Write the config file, creating its directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

fn non_negative(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

fn positive(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
