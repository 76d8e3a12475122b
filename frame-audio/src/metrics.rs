//! Pipeline health counters and periodic diagnostics
//!
//! Counters are plain integers owned by the renderer; the real-time callback
//! only increments them. Logging happens elsewhere, from whoever owns a
//! copy of the counters and calls `MetricsLog::maybe_log`.

use std::time::{Duration, Instant};

use tracing::debug;

/// Renderer health counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderMetrics {
    /// Output blocks rendered
    pub blocks_rendered: u64,
    /// Output frames rendered (underrun frames included)
    pub frames_rendered: u64,
    /// Frames filled from last-sample state
    pub underrun_frames: u64,
    /// Transitions from playing to starving
    pub underrun_episodes: u64,
    /// Well-formed chunks received
    pub chunks_received: u64,
    /// Chunks discarded because the queue was at its high-water mark
    pub chunks_dropped: u64,
    /// Messages discarded as malformed or misdirected
    pub malformed_messages: u64,
    /// Refill requests sent
    pub requests_sent: u64,
    /// Refill requests refused by a full request ring
    pub requests_dropped: u64,
    /// Lowest queue depth seen after a block
    pub depth_min: usize,
    /// Highest queue depth seen after a block
    pub depth_max: usize,
}

impl RenderMetrics {
    /// Track queue depth after a block
    pub fn update_depth(&mut self, depth: usize) {
        if self.blocks_rendered <= 1 {
            self.depth_min = depth;
            self.depth_max = depth;
        } else {
            self.depth_min = self.depth_min.min(depth);
            self.depth_max = self.depth_max.max(depth);
        }
    }
}

/// Rate-limited logger for `RenderMetrics`
#[derive(Debug)]
pub struct MetricsLog {
    interval: Duration,
    last_log_time: Instant,
}

impl MetricsLog {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_log_time: Instant::now(),
        }
    }

    /// Log metrics if enough time has passed
    ///
    /// Returns true if a line was emitted.
    pub fn maybe_log(&mut self, metrics: &RenderMetrics) -> bool {
        if self.last_log_time.elapsed() < self.interval {
            return false;
        }
        debug!(
            "audio pipeline: blocks={}, frames={}, underrun_frames={} ({} episodes), \
             chunks={}, dropped={}, malformed={}, requests={} (refused {}), depth={}..{}",
            metrics.blocks_rendered,
            metrics.frames_rendered,
            metrics.underrun_frames,
            metrics.underrun_episodes,
            metrics.chunks_received,
            metrics.chunks_dropped,
            metrics.malformed_messages,
            metrics.requests_sent,
            metrics.requests_dropped,
            metrics.depth_min,
            metrics.depth_max,
        );
        self.last_log_time = Instant::now();
        true
    }
}

impl Default for MetricsLog {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
