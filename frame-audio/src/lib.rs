//! Frame-paced audio delivery
//!
//! Moves audio synthesized once per video frame (an emulator's sound unit,
//! a tracker, a tone generator) to a fixed-cadence output callback that may
//! never block.
//!
//! # Architecture
//!
//! ```text
//! Producer context                          Real-time context
//!     │                                           │
//! [SampleSource]                                  │
//!     │                                           │
//! [ProducerEndpoint]◄────(RequestAudio)─────[Backpressure]
//!     │                                           │
//!     └─────────(AudioChunk, ring)──────────►[ChunkQueue]
//!                                                 │
//!                                            [Renderer]──►[OutputBlock]
//! ```
//!
//! - The renderer owns the queue, the playback cursor and the last-sample
//!   state; nothing else touches them.
//! - The only shared surface is a pair of lock-free rings, one per
//!   direction. Chunks are moved through them, never shared.
//! - When the queue is low and no request is in flight, the renderer asks
//!   for one more chunk. When it runs dry it repeats the last sample.
//!
//! # Usage
//!
//! ```ignore
//! let config = frame_audio::config::load();
//! let session = AudioSession::start(&config, |config| SquareTone::new(config, 440.0))?;
//! // ...
//! session.stop();
//! ```

pub mod backpressure;
pub mod block;
pub mod channel;
pub mod chunk;
pub mod config;
pub mod error;
pub mod host;
pub mod message;
pub mod metrics;
pub mod producer;
pub mod queue;
pub mod renderer;
pub mod session;
pub mod tone;

// Re-export public API
pub use block::{Interleaved, OutputBlock, Planar};
pub use channel::{ProducerLink, RendererLink, channel, channel_for_high_water};
pub use chunk::{ChannelCount, Chunk};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use host::SimulatedHost;
pub use message::Message;
pub use metrics::RenderMetrics;
pub use producer::{ProducerEndpoint, ProducerHandle, ProducerThread, SampleSource};
pub use renderer::Renderer;
pub use session::AudioSession;
pub use tone::{Duty, SquareTone};
