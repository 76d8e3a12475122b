//! Messages exchanged between the renderer and the producer
//!
//! The renderer sends `RequestAudio` when its queue runs low; the producer
//! answers with `AudioChunk`. Each direction uses its own channel, but both
//! carry the same tagged union so either side can reject a message that
//! arrived where it does not belong.

use crate::chunk::{ChannelCount, Chunk};

/// A message on the cross-context channel
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Renderer -> producer: synthesize one more chunk
    RequestAudio,

    /// Producer -> renderer: one chunk of interleaved samples
    ///
    /// `channel_count` is kept raw so the renderer can discard chunks that do
    /// not match its configured layout.
    AudioChunk {
        samples: Vec<f32>,
        channel_count: u8,
    },
}

impl Message {
    /// Validate an `AudioChunk` against the expected channel layout
    ///
    /// Returns `None` for `RequestAudio`, for a foreign channel count, or for
    /// a sample count that is not a whole number of frames.
    pub fn into_chunk(self, expected: ChannelCount) -> Option<Chunk> {
        match self {
            Message::AudioChunk {
                samples,
                channel_count,
            } => {
                let channels = ChannelCount::from_raw(channel_count)?;
                if channels != expected {
                    return None;
                }
                Chunk::new(samples, channels).ok()
            }
            Message::RequestAudio => None,
        }
    }
}

impl From<Chunk> for Message {
    fn from(chunk: Chunk) -> Self {
        let channel_count = chunk.channels().into();
        Message::AudioChunk {
            samples: chunk.into_samples(),
            channel_count,
        }
    }
}
