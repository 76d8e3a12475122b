//! Producer side of the pipeline
//!
//! The producer owns the synthesis engine (an emulator's sound unit, a
//! tracker, a test tone). Whenever it runs, typically once per video frame,
//! it answers each pending refill request with exactly one chunk.
//!
//! `ProducerEndpoint::service` is for hosts that already have a frame loop;
//! `ProducerThread` gives the producer a context of its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::channel::ProducerLink;
use crate::chunk::{ChannelCount, Chunk};
use crate::error::{Error, Result};
use crate::message::Message;

/// A synthesis engine that emits one chunk of audio per cycle
pub trait SampleSource {
    /// Channel layout of every chunk this source produces
    fn channels(&self) -> ChannelCount;

    /// Run one synthesis cycle, appending interleaved samples to `out`
    fn synthesize_frame(&mut self, out: &mut Vec<f32>);
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn channels(&self) -> ChannelCount {
        (**self).channels()
    }

    fn synthesize_frame(&mut self, out: &mut Vec<f32>) {
        (**self).synthesize_frame(out)
    }
}

/// Producer-side counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Refill requests received
    pub requests_received: u64,
    /// Chunks handed to the channel
    pub chunks_sent: u64,
    /// Chunks refused by a full channel
    pub chunks_refused: u64,
    /// Messages that do not belong on the request channel
    pub misdirected: u64,
}

/// Producer end of the channel
pub struct ProducerEndpoint {
    link: ProducerLink,
    stats: ProducerStats,
    /// Capacity hint for the next chunk's storage
    last_len: usize,
}

impl ProducerEndpoint {
    pub fn new(link: ProducerLink) -> Self {
        Self {
            link,
            stats: ProducerStats::default(),
            last_len: 0,
        }
    }

    /// Drain the request channel, returning how many refills were asked for
    pub fn take_requests(&mut self) -> usize {
        let mut requests = 0;
        while let Some(message) = self.link.requests.try_recv() {
            match message {
                Message::RequestAudio => requests += 1,
                Message::AudioChunk { .. } => {
                    self.stats.misdirected += 1;
                    trace!("Discarding audio chunk on request channel");
                }
            }
        }
        self.stats.requests_received += requests as u64;
        requests
    }

    /// Hand a chunk to the renderer
    ///
    /// Returns false if the channel was full and the chunk was dropped.
    pub fn send_chunk(&mut self, chunk: Chunk) -> bool {
        if self.link.chunks.send(chunk.into()) {
            self.stats.chunks_sent += 1;
            true
        } else {
            self.stats.chunks_refused += 1;
            debug!("Chunk channel full, dropping chunk");
            false
        }
    }

    /// Answer every pending request with one synthesized chunk
    ///
    /// Returns the number of chunks sent.
    pub fn service<S: SampleSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let requests = self.take_requests();
        let mut sent = 0;
        for _ in 0..requests {
            let mut samples = Vec::with_capacity(self.last_len);
            source.synthesize_frame(&mut samples);
            self.last_len = samples.len();

            match Chunk::new(samples, source.channels()) {
                Ok(chunk) => {
                    if self.send_chunk(chunk) {
                        sent += 1;
                    }
                }
                Err(e) => warn!("Discarding synthesized frame: {}", e),
            }
        }
        sent
    }

    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }
}

/// Dedicated producer context
pub struct ProducerThread;

impl ProducerThread {
    /// Spawn a thread that services requests once per `frame_period`
    ///
    /// # Errors
    ///
    /// Returns `Error::Thread` if the OS refuses to start the thread.
    pub fn spawn<S>(link: ProducerLink, mut source: S, frame_period: Duration) -> Result<ProducerHandle>
    where
        S: SampleSource + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::Builder::new()
            .name("audio-producer".into())
            .spawn(move || {
                let mut endpoint = ProducerEndpoint::new(link);
                debug!("Audio producer thread started");

                while running_clone.load(Ordering::Acquire) {
                    endpoint.service(&mut source);
                    // Unparked early on shutdown
                    thread::park_timeout(frame_period);
                }

                let stats = endpoint.stats().clone();
                debug!(
                    "Audio producer thread finished: requests={}, sent={}, refused={}",
                    stats.requests_received, stats.chunks_sent, stats.chunks_refused
                );
                stats
            })
            .map_err(Error::Thread)?;

        Ok(ProducerHandle {
            running,
            handle: Some(handle),
        })
    }
}

/// Handle to a running producer thread
///
/// Dropping the handle stops and joins the thread.
pub struct ProducerHandle {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<ProducerStats>>,
}

impl ProducerHandle {
    /// Check if the producer thread is still running
    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the thread and return its final counters
    pub fn stop(mut self) -> Option<ProducerStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<ProducerStats> {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.take()?;
        handle.thread().unpark();
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("Audio producer thread panicked");
                None
            }
        }
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
