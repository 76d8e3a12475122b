//! Real-time renderer
//!
//! Invoked by the host audio clock once per output block. It drains arrived
//! chunks into the queue, copies samples out frame by frame, sustains the
//! last sample when the queue runs dry and asks the producer for more when
//! the queue gets low.
//!
//! ```text
//! Producer                          Renderer (audio callback)
//!     │                                  │
//!     │◄─────(RequestAudio)──────────[Backpressure]
//! [Synthesize]                           │
//! [AudioChunk]─────(ring)──────────►[Drain inbox → ChunkQueue]
//!                                    [Cursor → OutputBlock]
//! ```
//!
//! Everything here is owned by the real-time context. The callback never
//! blocks, never waits on the producer, never logs, and only allocates when
//! it frees a finished or rejected chunk.

use crate::backpressure::Backpressure;
use crate::block::{Interleaved, OutputBlock};
use crate::channel::RendererLink;
use crate::chunk::{ChannelCount, Chunk};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::message::Message;
use crate::metrics::RenderMetrics;
use crate::queue::{ChunkQueue, Enqueue};

#[cfg(test)]
mod tests;

/// Playback position inside the chunk being played
#[derive(Debug)]
struct Cursor {
    chunk: Chunk,
    /// Sample index of the next frame; always a multiple of the channel count
    offset: usize,
}

/// Renderer state, exclusively owned by the real-time context
pub struct Renderer {
    channels: ChannelCount,
    queue: ChunkQueue,
    cursor: Option<Cursor>,
    /// Last real sample per chunk channel, replayed during underrun
    last_samples: [f32; 2],
    controller: Backpressure,
    link: RendererLink,
    metrics: RenderMetrics,
    starving: bool,
}

impl Renderer {
    /// Create a renderer with an empty queue and zeroed last-sample state
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: &PipelineConfig, link: RendererLink) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channels: config.channels,
            queue: ChunkQueue::new(config.high_water),
            cursor: None,
            last_samples: [0.0; 2],
            controller: Backpressure::new(config.low_water),
            link,
            metrics: RenderMetrics::default(),
            starving: false,
        })
    }

    /// Fill one output block
    ///
    /// Always returns true: the renderer has no stop condition of its own,
    /// teardown belongs to the session that owns it.
    pub fn process<B: OutputBlock + ?Sized>(&mut self, block: &mut B) -> bool {
        self.drain_inbox();

        let outputs = block.channels();
        let frames = block.frames();
        let width = self.channels.get();

        for frame in 0..frames {
            if self.cursor.is_none() {
                self.start_next_chunk();
            }

            let finished = if let Some(cursor) = self.cursor.as_mut() {
                let samples = &cursor.chunk.samples()[cursor.offset..cursor.offset + width];
                for channel in 0..outputs {
                    block.set(frame, channel, samples[channel.min(width - 1)]);
                }
                self.last_samples[..width].copy_from_slice(samples);
                self.starving = false;

                cursor.offset += width;
                cursor.offset >= cursor.chunk.len()
            } else {
                if !self.starving {
                    self.starving = true;
                    self.metrics.underrun_episodes += 1;
                }
                self.metrics.underrun_frames += 1;
                for channel in 0..outputs {
                    block.set(frame, channel, self.last_samples[channel.min(width - 1)]);
                }
                false
            };

            if finished {
                self.cursor = None;
            }
        }

        self.metrics.blocks_rendered += 1;
        self.metrics.frames_rendered += frames as u64;
        self.metrics.update_depth(self.queue.depth());

        if self.controller.should_request(self.queue.depth()) {
            self.send_request();
        }

        true
    }

    /// Fill an interleaved device buffer
    ///
    /// # Panics
    ///
    /// Panics if `data` does not split evenly into `channels`.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) -> bool {
        self.process(&mut Interleaved::new(data, channels))
    }

    /// Apply one inbound message
    ///
    /// Well-formed chunks release the request latch and are queued (or
    /// dropped at the high-water mark). Anything else is discarded without
    /// touching queue or latch.
    pub fn deliver(&mut self, message: Message) {
        let Some(chunk) = message.into_chunk(self.channels) else {
            self.metrics.malformed_messages += 1;
            return;
        };

        self.controller.chunk_received();
        self.metrics.chunks_received += 1;

        if chunk.is_empty() {
            return;
        }
        if self.queue.enqueue(chunk) == Enqueue::Dropped {
            self.metrics.chunks_dropped += 1;
        }
    }

    fn drain_inbox(&mut self) {
        while let Some(message) = self.link.chunks.try_recv() {
            self.deliver(message);
        }
    }

    /// Send one refill request and latch it
    ///
    /// A refused send leaves the latch open so the next block retries.
    fn send_request(&mut self) {
        if self.link.requests.send(Message::RequestAudio) {
            self.controller.request_sent();
            self.metrics.requests_sent += 1;
        } else {
            self.metrics.requests_dropped += 1;
        }
    }

    fn start_next_chunk(&mut self) {
        while let Some(chunk) = self.queue.dequeue_front() {
            if !chunk.is_empty() {
                self.cursor = Some(Cursor { chunk, offset: 0 });
                return;
            }
        }
    }

    /// Chunks queued behind the active one
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Refill requests in flight (0 or 1)
    pub fn outstanding_requests(&self) -> u8 {
        self.controller.outstanding()
    }

    /// Whether a chunk is partially played
    pub fn has_active_chunk(&self) -> bool {
        self.cursor.is_some()
    }

    /// Last real sample per chunk channel
    pub fn last_samples(&self) -> &[f32] {
        &self.last_samples[..self.channels.get()]
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }
}

