//! frame-audio - reference tone player
//!
//! Plays a handheld-style square wave through the frame-paced audio
//! pipeline, on the default output device or on a headless clock.
//!
//! # Usage
//!
//! ```bash
//! frame-audio                         # 5 s of A4 on the default device
//! frame-audio --frequency 262 --duty eighth --seconds 2
//! frame-audio --headless --seconds 30 # simulated clock, prints pipeline stats
//! frame-audio --config my.toml --low-water 4
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use frame_audio::config::{self, PipelineConfig};
use frame_audio::{AudioSession, ChannelCount, Duty, SimulatedHost, SquareTone};

#[derive(Parser)]
#[command(name = "frame-audio")]
#[command(author, version, about = "Play a reference tone through the frame-paced audio pipeline")]
struct Args {
    /// Pipeline config file (default: platform config dir, then built-in defaults)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run on a simulated clock instead of an output device
    #[arg(long)]
    headless: bool,

    /// Playback length in seconds
    #[arg(long, short = 't', default_value = "5")]
    seconds: f64,

    /// Tone frequency in Hz
    #[arg(long, short = 'f', default_value = "440")]
    frequency: f32,

    /// Pulse width
    #[arg(long, value_enum, default_value = "half")]
    duty: DutyArg,

    /// 4-bit volume (0-15)
    #[arg(long, default_value = "12")]
    volume: u8,

    /// Produce single-channel chunks
    #[arg(long)]
    mono: bool,

    /// Override the low-water mark
    #[arg(long)]
    low_water: Option<usize>,

    /// Override the high-water mark
    #[arg(long)]
    high_water: Option<usize>,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DutyArg {
    Eighth,
    Quarter,
    Half,
    ThreeQuarters,
}

impl From<DutyArg> for Duty {
    fn from(duty: DutyArg) -> Self {
        match duty {
            DutyArg::Eighth => Duty::Eighth,
            DutyArg::Quarter => Duty::Quarter,
            DutyArg::Half => Duty::Half,
            DutyArg::ThreeQuarters => Duty::ThreeQuarters,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("Playback length must be a positive number of seconds");
    }
    if args.volume > 15 {
        anyhow::bail!("Volume must be between 0 and 15");
    }

    let config = effective_config(&args)?;
    config.validate().context("invalid pipeline configuration")?;

    if let Some(path) = &args.write_config {
        config::save_to(&config, path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let duration = Duration::from_secs_f64(args.seconds);
    let duty = Duty::from(args.duty);
    let make_source = |config: &PipelineConfig| {
        SquareTone::new(config, args.frequency)
            .with_duty(duty)
            .with_volume(args.volume)
    };

    if args.headless {
        run_headless(&config, make_source(&config), duration)
    } else {
        run_device(&config, make_source, duration)
    }
}

/// Config file (or defaults) with command-line overrides applied
fn effective_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::load(),
    };
    if args.mono {
        config.channels = ChannelCount::Mono;
    }
    if let Some(low_water) = args.low_water {
        config.low_water = low_water;
    }
    if let Some(high_water) = args.high_water {
        config.high_water = high_water;
    }
    Ok(config)
}

fn run_headless(config: &PipelineConfig, source: SquareTone, duration: Duration) -> Result<()> {
    let output_channels = config.channels.get();
    let mut host = SimulatedHost::new(config, source, output_channels)?;

    let mut peak = 0.0f32;
    host.run_for(duration, |block| {
        peak = block.iter().fold(peak, |peak, s| peak.max(s.abs()));
    });

    let metrics = host.metrics();
    let producer = host.producer_stats();
    info!(
        "Rendered {:.2}s headless: {} blocks, peak {:.3}",
        host.elapsed().as_secs_f64(),
        metrics.blocks_rendered,
        peak
    );
    info!(
        "Queue: depth {}..{}, {} chunks received, {} dropped, {} malformed",
        metrics.depth_min,
        metrics.depth_max,
        metrics.chunks_received,
        metrics.chunks_dropped,
        metrics.malformed_messages
    );
    info!(
        "Underrun: {} frames in {} episodes; requests sent {}, answered {}",
        metrics.underrun_frames,
        metrics.underrun_episodes,
        metrics.requests_sent,
        producer.chunks_sent
    );
    Ok(())
}

fn run_device<F>(config: &PipelineConfig, make_source: F, duration: Duration) -> Result<()>
where
    F: FnOnce(&PipelineConfig) -> SquareTone,
{
    let session = AudioSession::start(config, make_source).context("failed to start audio session")?;
    info!(
        "Playing for {:.1}s at {}Hz on {} output channels",
        duration.as_secs_f64(),
        session.sample_rate(),
        session.output_channels()
    );

    std::thread::sleep(duration);

    if !session.is_alive() {
        warn!("Audio producer thread exited before the session was stopped");
    }

    if let Some(stats) = session.stop() {
        info!(
            "Producer answered {} of {} requests ({} refused by a full channel)",
            stats.chunks_sent, stats.requests_received, stats.chunks_refused
        );
    }
    Ok(())
}
