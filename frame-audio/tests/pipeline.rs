//! End-to-end tests for the audio pipeline.
//!
//! These drive the renderer and producer together, either on the
//! deterministic headless clock or across a real producer thread.

use std::thread;
use std::time::{Duration, Instant};

use frame_audio::{
    ChannelCount, PipelineConfig, ProducerThread, Renderer, SampleSource, SimulatedHost,
    SquareTone, channel_for_high_water,
};

/// Mono source emitting a continuous ramp 1, 2, 3, ... split into cycles
struct Ramp {
    next: f32,
    frames: usize,
}

impl SampleSource for Ramp {
    fn channels(&self) -> ChannelCount {
        ChannelCount::Mono
    }

    fn synthesize_frame(&mut self, out: &mut Vec<f32>) {
        for _ in 0..self.frames {
            out.push(self.next);
            self.next += 1.0;
        }
    }
}

/// Producer wakes once per render quantum: 48000 / 375 = 128 frames
fn per_quantum_config() -> PipelineConfig {
    PipelineConfig {
        channels: ChannelCount::Mono,
        sample_rate: 48_000,
        frame_rate: 60.0,
        refresh_rate: 375.0,
        render_quantum: 128,
        ..Default::default()
    }
}

#[test]
fn test_output_is_concatenation_of_chunks() {
    let config = per_quantum_config();
    let source = Ramp {
        next: 1.0,
        frames: 100,
    };
    let mut host = SimulatedHost::new(&config, source, 1).unwrap();

    let mut output = Vec::new();
    host.run_for(Duration::from_secs(2), |block| output.extend_from_slice(block));

    // Drop start-up silence and collapse sustained repeats
    let mut played: Vec<f32> = output.into_iter().skip_while(|&s| s == 0.0).collect();
    played.dedup();

    assert!(!played.is_empty());
    for (index, &sample) in played.iter().enumerate() {
        assert_eq!(sample, (index + 1) as f32, "sample {index} out of order");
    }
}

#[test]
fn test_responsive_producer_never_starves_after_startup() {
    let config = per_quantum_config();
    let source = SquareTone::new(&config, 440.0);
    let mut host = SimulatedHost::new(&config, source, 2).unwrap();

    host.run_for(Duration::from_secs(10), |_| {});

    let metrics = host.metrics().clone();
    // Only the very first block, rendered before anything was requested
    assert_eq!(metrics.underrun_frames, 128);
    assert_eq!(metrics.underrun_episodes, 1);
    assert_eq!(metrics.chunks_dropped, 0);
    assert_eq!(metrics.malformed_messages, 0);
    assert!(metrics.depth_max <= config.low_water);

    let in_flight = metrics.requests_sent - metrics.chunks_received;
    assert!(in_flight <= 1);
    assert_eq!(
        host.producer_stats().chunks_sent,
        host.producer_stats().requests_received
    );
}

#[test]
fn test_display_paced_producer_settles() {
    // 60 Hz wake-ups, each answering with one 59.7275 Hz frame of audio
    let config = PipelineConfig::default();
    let source = SquareTone::new(&config, 440.0);
    let mut host = SimulatedHost::new(&config, source, 2).unwrap();

    let mut max_depth = 0;
    let mut max_outstanding = 0;
    for _ in 0..(20 * 44_100 / 128) {
        host.step();
        max_depth = max_depth.max(host.renderer().queue_depth());
        max_outstanding = max_outstanding.max(host.renderer().outstanding_requests());
    }
    assert!(max_depth <= config.low_water);
    assert_eq!(max_outstanding, 1);

    // Slack has built up; no further starvation
    let underruns = host.metrics().underrun_frames;
    host.run_for(Duration::from_secs(10), |_| {});
    assert_eq!(host.metrics().underrun_frames, underruns);
    assert_eq!(host.metrics().chunks_dropped, 0);
}

#[test]
fn test_renderer_fed_by_producer_thread() {
    let config = PipelineConfig {
        channels: ChannelCount::Mono,
        ..Default::default()
    };
    let (link, producer_link) = channel_for_high_water(config.high_water);
    let mut renderer = Renderer::new(&config, link).unwrap();
    let source = Ramp {
        next: 1.0,
        frames: 64,
    };
    let producer = ProducerThread::spawn(producer_link, source, Duration::from_millis(1)).unwrap();

    let mut output = Vec::new();
    let mut block = [0.0f32; 128];
    let deadline = Instant::now() + Duration::from_secs(5);
    while renderer.metrics().chunks_received < 4 {
        assert!(Instant::now() < deadline, "producer thread never delivered");
        assert!(renderer.process_interleaved(&mut block, 1));
        output.extend_from_slice(&block);
        thread::sleep(Duration::from_millis(2));
    }

    let stats = producer.stop().unwrap();
    assert!(stats.chunks_sent >= 4);
    assert_eq!(renderer.metrics().malformed_messages, 0);

    // Whatever arrived played back in order
    let mut played: Vec<f32> = output.into_iter().skip_while(|&s| s == 0.0).collect();
    played.dedup();
    for (index, &sample) in played.iter().enumerate() {
        assert_eq!(sample, (index + 1) as f32);
    }
}
