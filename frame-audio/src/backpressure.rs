//! Refill request controller
//!
//! Level-triggered and single-flight: a request goes out when the queue is
//! below the low-water mark and nothing is outstanding. Any chunk arriving
//! clears the latch, whether or not it answers that particular request.
//! There is no timeout; if the producer never answers, no further request
//! is ever sent and the renderer keeps sustaining.

/// Backpressure state co-located with the renderer
#[derive(Debug, Clone)]
pub struct Backpressure {
    low_water: usize,
    outstanding: u8,
}

impl Backpressure {
    pub fn new(low_water: usize) -> Self {
        Self {
            low_water,
            outstanding: 0,
        }
    }

    /// Whether a refill request should be sent for the given queue depth
    pub fn should_request(&self, depth: usize) -> bool {
        depth < self.low_water && self.outstanding == 0
    }

    /// Record that a request went out
    pub fn request_sent(&mut self) {
        self.outstanding = 1;
    }

    /// Record that a chunk arrived
    pub fn chunk_received(&mut self) {
        self.outstanding = 0;
    }

    /// Requests in flight (0 or 1)
    pub fn outstanding(&self) -> u8 {
        self.outstanding
    }
}
