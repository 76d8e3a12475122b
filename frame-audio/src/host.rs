//! Headless host with a virtual audio clock
//!
//! Drives the renderer in fixed render quanta, the way an audio device
//! would, and wakes the producer once per refresh period on the same
//! thread. Time is counted in output frames, so runs are fully
//! deterministic: useful for tests, benchmarks and machines without an
//! output device.

use std::time::Duration;

use crate::block::Interleaved;
use crate::channel::channel_for_high_water;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::metrics::{MetricsLog, RenderMetrics};
use crate::producer::{ProducerEndpoint, ProducerStats, SampleSource};
use crate::renderer::Renderer;

/// Renderer and producer on a simulated clock
pub struct SimulatedHost<S: SampleSource> {
    renderer: Renderer,
    endpoint: ProducerEndpoint,
    source: S,
    sample_rate: u32,
    output_channels: usize,
    quantum: usize,
    frames_per_refresh: f64,
    /// Clock position (in frames) of the next producer wake-up
    next_refresh_at: f64,
    /// Output frames rendered so far
    clock: u64,
    /// Interleaved output of the most recent quantum
    block: Vec<f32>,
    metrics_log: MetricsLog,
}

impl<S: SampleSource> SimulatedHost<S> {
    /// Build a session with `output_channels` device channels
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config is invalid, the output has no
    /// channels, or the source's layout differs from `config.channels`.
    pub fn new(config: &PipelineConfig, source: S, output_channels: usize) -> Result<Self> {
        config.validate()?;
        if output_channels == 0 {
            return Err(Error::Config("output needs at least one channel".into()));
        }
        if source.channels() != config.channels {
            return Err(Error::Config(format!(
                "source produces {}-channel audio, pipeline expects {}",
                source.channels(),
                config.channels
            )));
        }

        let (link, producer) = channel_for_high_water(config.high_water);
        Ok(Self {
            renderer: Renderer::new(config, link)?,
            endpoint: ProducerEndpoint::new(producer),
            source,
            sample_rate: config.sample_rate,
            output_channels,
            quantum: config.render_quantum,
            frames_per_refresh: config.frames_per_refresh(),
            next_refresh_at: 0.0,
            clock: 0,
            block: vec![0.0; config.render_quantum * output_channels],
            metrics_log: MetricsLog::default(),
        })
    }

    /// Advance the clock by one render quantum
    ///
    /// Wakes the producer for every refresh that falls due, then renders.
    /// Returns the interleaved block just rendered.
    pub fn step(&mut self) -> &[f32] {
        let clock = self.clock as f64;
        if clock >= self.next_refresh_at {
            // Requests only arrive between quanta, so one service covers every due wake-up
            self.endpoint.service(&mut self.source);
            let due = ((clock - self.next_refresh_at) / self.frames_per_refresh).floor() + 1.0;
            self.next_refresh_at += due * self.frames_per_refresh;
        }

        let mut block = Interleaved::new(&mut self.block, self.output_channels);
        self.renderer.process(&mut block);
        self.clock += self.quantum as u64;

        self.metrics_log.maybe_log(self.renderer.metrics());
        &self.block
    }

    /// Render at least `duration` of audio, passing each block to `sink`
    pub fn run_for(&mut self, duration: Duration, mut sink: impl FnMut(&[f32])) {
        let target = self.clock + (duration.as_secs_f64() * f64::from(self.sample_rate)).ceil() as u64;
        while self.clock < target {
            sink(self.step());
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn metrics(&self) -> &RenderMetrics {
        self.renderer.metrics()
    }

    pub fn producer_stats(&self) -> &ProducerStats {
        self.endpoint.stats()
    }

    /// Output frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.clock
    }

    /// Simulated time elapsed
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.clock as f64 / f64::from(self.sample_rate))
    }
}
