//! Error types for the audio pipeline
//!
//! Only setup and I/O paths return errors. Overflow, underrun and malformed
//! messages are routine conditions handled inside the renderer and never
//! surface here.

use std::path::PathBuf;

use crate::chunk::ChannelCount;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or starting an audio session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration values violate a pipeline invariant
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading or writing a config file failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `PipelineConfig`
    #[error("failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Config could not be encoded as TOML
    #[error("failed to serialize config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The host has no default output device
    #[error("no audio output device available")]
    NoOutputDevice,

    /// Querying the output device failed
    #[error("output device error: {0}")]
    Device(String),

    /// The device's native sample format is not one we can render into
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// Building or starting the output stream failed
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The producer thread could not be started
    #[error("failed to spawn producer thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// A chunk whose sample count does not divide evenly into frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{len} samples cannot be split into {channels}-channel frames")]
pub struct ChunkError {
    pub len: usize,
    pub channels: ChannelCount,
}

/// A message that could not be placed on a full channel
///
/// The rejected message is handed back so the caller keeps ownership.
#[derive(Debug, thiserror::Error)]
#[error("channel full, message dropped")]
pub struct SendError<T>(pub T);
