//! Pipeline configuration (config.toml)
//!
//! Tunables for queue thresholds and timing. Stored as TOML; every key is
//! optional and falls back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::ChannelCount;
use crate::error::{Error, Result};

/// Refresh rate of the handheld the reference producer emulates (4194304 / 70224 Hz)
pub const HANDHELD_FRAME_RATE: f64 = 59.7275;

/// Audio pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Request a refill when fewer chunks than this are queued (default: 3)
    #[serde(default = "default_low_water")]
    pub low_water: usize,
    /// Maximum queued chunks; extra chunks are dropped (default: 60)
    #[serde(default = "default_high_water")]
    pub high_water: usize,
    /// Channels per chunk, 1 or 2 (default: 2)
    #[serde(default)]
    pub channels: ChannelCount,
    /// Output sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Producer cycles per second, one chunk per cycle (default: 59.7275)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Producer wake-ups per second, e.g. the display refresh (default: 60)
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    /// Frames per renderer invocation on the headless clock (default: 128)
    #[serde(default = "default_render_quantum")]
    pub render_quantum: usize,
}

fn default_low_water() -> usize {
    3
}
fn default_high_water() -> usize {
    60
}
fn default_sample_rate() -> u32 {
    44_100
}
fn default_frame_rate() -> f64 {
    HANDHELD_FRAME_RATE
}
fn default_refresh_rate() -> f64 {
    60.0
}
fn default_render_quantum() -> usize {
    128
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            low_water: default_low_water(),
            high_water: default_high_water(),
            channels: ChannelCount::default(),
            sample_rate: default_sample_rate(),
            frame_rate: default_frame_rate(),
            refresh_rate: default_refresh_rate(),
            render_quantum: default_render_quantum(),
        }
    }
}

impl PipelineConfig {
    /// Check the invariants the renderer relies on
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if:
    /// - `low_water` is zero or not below `high_water`
    /// - `sample_rate`, `frame_rate`, `refresh_rate` or `render_quantum` is not positive
    /// - `frame_rate` or `refresh_rate` exceeds `sample_rate` (less than one frame per cycle)
    pub fn validate(&self) -> Result<()> {
        if self.low_water == 0 {
            return Err(Error::Config("low_water must be at least 1".into()));
        }
        if self.low_water >= self.high_water {
            return Err(Error::Config(format!(
                "low_water ({}) must be below high_water ({})",
                self.low_water, self.high_water
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::Config("sample_rate must be positive".into()));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(Error::Config(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(self.refresh_rate.is_finite() && self.refresh_rate > 0.0) {
            return Err(Error::Config(format!(
                "refresh_rate must be positive, got {}",
                self.refresh_rate
            )));
        }
        let sample_rate = f64::from(self.sample_rate);
        if self.frame_rate > sample_rate {
            return Err(Error::Config(format!(
                "frame_rate ({}) must not exceed sample_rate ({})",
                self.frame_rate, self.sample_rate
            )));
        }
        if self.refresh_rate > sample_rate {
            return Err(Error::Config(format!(
                "refresh_rate ({}) must not exceed sample_rate ({})",
                self.refresh_rate, self.sample_rate
            )));
        }
        if self.render_quantum == 0 {
            return Err(Error::Config("render_quantum must be positive".into()));
        }
        Ok(())
    }

    /// Output samples per producer cycle, before rounding
    pub fn frames_per_cycle(&self) -> f64 {
        f64::from(self.sample_rate) / self.frame_rate
    }

    /// Output frames between producer wake-ups
    pub fn frames_per_refresh(&self) -> f64 {
        f64::from(self.sample_rate) / self.refresh_rate
    }

    /// Wall-clock time between producer wake-ups
    pub fn refresh_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.refresh_rate)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/frame-audio`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "", "frame-audio").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> PipelineConfig {
    config_dir()
        .and_then(|dir| load_from(dir.join("config.toml")).ok())
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
/// The loaded values are not validated; call `validate()`.
pub fn load_from(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to an explicit path.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &PipelineConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_err)
}
