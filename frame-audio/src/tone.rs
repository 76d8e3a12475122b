//! Reference sample source: a handheld-style pulse channel
//!
//! Modelled on the square channel of an 8-bit handheld's sound unit:
//! 8-step duty patterns, 4-bit volume, a linear DAC mapping `0..=15` onto
//! `-1.0..=1.0` and the capacitor high-pass that removes the DAC's DC
//! offset. Each call to `synthesize_frame` produces one video frame worth
//! of samples, carrying the fractional remainder into the next frame so the
//! long-run rate matches the output sample rate exactly.

use serde::{Deserialize, Serialize};

use crate::chunk::ChannelCount;
use crate::config::PipelineConfig;
use crate::producer::SampleSource;

/// Waveform steps, one row per duty setting
const DUTY_PATTERNS: [[u8; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 0, 0],
];

/// Master clock of the emulated handheld, used for the high-pass charge rate
const MASTER_CLOCK_HZ: f64 = 4_194_304.0;

/// Per-clock charge factor of the output capacitor
const CAPACITOR_CHARGE_PER_CLOCK: f64 = 0.999958;

/// Pulse width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duty {
    /// 12.5 %
    Eighth,
    /// 25 %
    Quarter,
    /// 50 %
    #[default]
    Half,
    /// 75 %
    ThreeQuarters,
}

impl Duty {
    fn pattern(self) -> &'static [u8; 8] {
        &DUTY_PATTERNS[self as usize]
    }
}

/// Map a 4-bit DAC input onto `-1.0..=1.0`
pub fn digital_to_analog(value: u8) -> f32 {
    (f32::from(value) / 7.5) - 1.0
}

/// Square-wave voice producing one chunk per video frame
#[derive(Debug, Clone)]
pub struct SquareTone {
    channels: ChannelCount,
    sample_rate: u32,
    frames_per_cycle: f64,
    /// Fractional frame carried between cycles
    carry: f64,
    frequency: f32,
    /// Position within one waveform period, `0.0..1.0`
    phase: f32,
    duty: Duty,
    volume: u8,
    capacitor: f32,
    charge: f32,
}

impl SquareTone {
    /// Tone at `frequency` Hz using the config's rate, frame rate and layout
    pub fn new(config: &PipelineConfig, frequency: f32) -> Self {
        let charge =
            CAPACITOR_CHARGE_PER_CLOCK.powf(MASTER_CLOCK_HZ / f64::from(config.sample_rate)) as f32;
        Self {
            channels: config.channels,
            sample_rate: config.sample_rate,
            frames_per_cycle: config.frames_per_cycle(),
            carry: 0.0,
            frequency,
            phase: 0.0,
            duty: Duty::default(),
            volume: 15,
            capacitor: 0.0,
            charge,
        }
    }

    pub fn with_duty(mut self, duty: Duty) -> Self {
        self.duty = duty;
        self
    }

    /// Set the 4-bit volume (values above 15 are capped)
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(15);
        self
    }

    /// High-pass charge factor for the configured sample rate
    pub fn charge_factor(&self) -> f32 {
        self.charge
    }

    fn next_sample(&mut self) -> f32 {
        let step = ((self.phase * 8.0) as usize).min(7);
        let level = self.duty.pattern()[step] * self.volume;
        let input = digital_to_analog(level);

        let out = input - self.capacitor;
        self.capacitor = input - out * self.charge;

        self.phase += self.frequency / self.sample_rate as f32;
        self.phase -= self.phase.floor();
        out
    }
}

impl SampleSource for SquareTone {
    fn channels(&self) -> ChannelCount {
        self.channels
    }

    fn synthesize_frame(&mut self, out: &mut Vec<f32>) {
        let exact = self.frames_per_cycle + self.carry;
        let frames = exact as usize;
        self.carry = exact - frames as f64;

        let width = self.channels.get();
        out.reserve(frames * width);
        for _ in 0..frames {
            let sample = self.next_sample();
            for _ in 0..width {
                out.push(sample);
            }
        }
    }
}
