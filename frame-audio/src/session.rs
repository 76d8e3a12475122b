//! Audio session on the default output device
//!
//! Session start opens the device, moves a freshly built renderer into the
//! cpal callback and spawns the producer thread. Session stop tears both
//! down; whatever is still queued is discarded.
//!
//! The device's native rate wins: there is no resampling, so the source is
//! built after the rate is known.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use crate::channel::channel_for_high_water;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::producer::{ProducerHandle, ProducerStats, ProducerThread, SampleSource};
use crate::renderer::Renderer;

/// Scratch frames when the device does not report its block size
const DEFAULT_SCRATCH_FRAMES: usize = 2048;

/// Upper bound on pre-allocated scratch frames; larger blocks render in pieces
const MAX_SCRATCH_FRAMES: usize = 8192;

/// A running playback session
pub struct AudioSession {
    /// The cpal stream (dropped first so the callback stops before the producer)
    stream: cpal::Stream,
    producer: ProducerHandle,
    config: PipelineConfig,
    output_channels: u16,
}

impl AudioSession {
    /// Start playback on the default output device
    ///
    /// `make_source` receives the effective configuration, whose
    /// `sample_rate` is the device's.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no device is
    /// available, the device format is unsupported, the source's layout
    /// differs from `config.channels`, or the stream fails to start.
    pub fn start<S, F>(config: &PipelineConfig, make_source: F) -> Result<Self>
    where
        S: SampleSource + Send + 'static,
        F: FnOnce(&PipelineConfig) -> S,
    {
        config.validate()?;

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| Error::Device(e.to_string()))?;

        let config = PipelineConfig {
            sample_rate: supported.sample_rate().0,
            ..config.clone()
        };
        let output_channels = supported.channels();
        let sample_format = supported.sample_format();

        let source = make_source(&config);
        if source.channels() != config.channels {
            return Err(Error::Config(format!(
                "source produces {}-channel audio, pipeline expects {}",
                source.channels(),
                config.channels
            )));
        }

        let (link, producer_link) = channel_for_high_water(config.high_water);
        let mut renderer = Renderer::new(&config, link)?;
        let channels = usize::from(output_channels);
        let scratch_len = scratch_samples(supported.buffer_size(), channels);
        let stream_config: cpal::StreamConfig = supported.into();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.process_interleaved(data, channels);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => {
                let mut scratch: Vec<f32> = vec![0.0; scratch_len];
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        render_converted(&mut renderer, &mut scratch, data, channels, |f| {
                            (f * 32767.0).clamp(-32768.0, 32767.0) as i16
                        });
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let mut scratch: Vec<f32> = vec![0.0; scratch_len];
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        render_converted(&mut renderer, &mut scratch, data, channels, |f| {
                            (f * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16
                        });
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            other => return Err(Error::UnsupportedSampleFormat(format!("{other:?}"))),
        }
        .map_err(|e| Error::Stream(format!("failed to build audio stream: {e}")))?;

        let producer = ProducerThread::spawn(producer_link, source, config.refresh_period())?;

        stream
            .play()
            .map_err(|e| Error::Stream(format!("failed to play audio stream: {e}")))?;

        info!(
            "Audio session started: {}Hz, {} output channels, {}-channel chunks, low/high water {}/{}",
            config.sample_rate, output_channels, config.channels, config.low_water, config.high_water
        );

        Ok(Self {
            stream,
            producer,
            config,
            output_channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn output_channels(&self) -> u16 {
        self.output_channels
    }

    /// Check if the producer thread is still running
    pub fn is_alive(&self) -> bool {
        self.producer.is_alive()
    }

    /// Stop playback and release the device and producer
    ///
    /// Returns the producer's final counters.
    pub fn stop(self) -> Option<ProducerStats> {
        let Self {
            stream, producer, ..
        } = self;
        drop(stream);
        let stats = producer.stop();
        debug!("Audio session stopped");
        stats
    }
}

/// Scratch samples for integer formats, sized from the device's block size
fn scratch_samples(buffer_size: &cpal::SupportedBufferSize, channels: usize) -> usize {
    let frames = match buffer_size {
        cpal::SupportedBufferSize::Range { max, .. } => (*max as usize).min(MAX_SCRATCH_FRAMES),
        cpal::SupportedBufferSize::Unknown => DEFAULT_SCRATCH_FRAMES,
    };
    frames.max(1) * channels.max(1)
}

/// Render into `scratch` and convert into a device buffer of another format
///
/// Blocks larger than the scratch buffer are rendered in whole-frame
/// pieces, so the callback never allocates.
fn render_converted<T>(
    renderer: &mut Renderer,
    scratch: &mut [f32],
    data: &mut [T],
    channels: usize,
    convert: impl Fn(f32) -> T,
) {
    let piece = (scratch.len() / channels).max(1) * channels;
    for out in data.chunks_mut(piece) {
        let rendered = &mut scratch[..out.len()];
        renderer.process_interleaved(rendered, channels);
        for (sample, &f) in out.iter_mut().zip(rendered.iter()) {
            *sample = convert(f);
        }
    }
}
