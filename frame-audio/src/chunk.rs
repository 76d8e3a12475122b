//! Chunks of interleaved audio samples
//!
//! A chunk is the unit of work the producer emits once per synthesis cycle.
//! Its samples are interleaved by channel (`L0 R0 L1 R1 ...` for stereo) and
//! are passed through untouched: nothing clamps them to `[-1.0, 1.0]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChunkError;

/// Number of interleaved channels in a chunk stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChannelCount {
    Mono,
    #[default]
    Stereo,
}

impl ChannelCount {
    /// Parse a raw channel count, accepting only 1 and 2
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }

    /// Channel count as a plain integer
    pub const fn get(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl From<ChannelCount> for u8 {
    fn from(channels: ChannelCount) -> Self {
        channels.get() as u8
    }
}

impl TryFrom<u8> for ChannelCount {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or_else(|| format!("channel count must be 1 or 2, got {raw}"))
    }
}

impl fmt::Display for ChannelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// An ordered block of interleaved samples
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    samples: Vec<f32>,
    channels: ChannelCount,
}

impl Chunk {
    /// Wrap interleaved samples, rejecting a length that leaves a partial frame
    pub fn new(samples: Vec<f32>, channels: ChannelCount) -> Result<Self, ChunkError> {
        if samples.len() % channels.get() != 0 {
            return Err(ChunkError {
                len: samples.len(),
                channels,
            });
        }
        Ok(Self { samples, channels })
    }

    /// Single-channel chunk; every length is valid
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            samples,
            channels: ChannelCount::Mono,
        }
    }

    pub fn channels(&self) -> ChannelCount {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.get()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Give up the sample storage
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}
