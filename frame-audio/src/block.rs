//! Output block descriptors handed to the renderer by the host
//!
//! A host exposes one equal-length writable array per channel. `Planar`
//! wraps per-channel slices directly; `Interleaved` wraps the single
//! interleaved slice that device callbacks usually provide.
//!
//! Unequal channel lengths mean the host binding is wired wrong. That is a
//! programming error, not a runtime condition, so construction panics.

/// A writable block of output frames
///
/// Implementors must guarantee that every channel holds exactly `frames()`
/// samples, checked once when the block is built, and panic there if not.
/// The renderer writes `frames() x channels()` samples without further
/// checks. `Planar` and `Interleaved` enforce this in their constructors.
pub trait OutputBlock {
    /// Number of output channels
    fn channels(&self) -> usize;

    /// Frames per channel
    fn frames(&self) -> usize;

    /// Write one sample
    fn set(&mut self, frame: usize, channel: usize, sample: f32);

    /// Read back one sample
    fn get(&self, frame: usize, channel: usize) -> f32;
}

/// One slice per channel, all the same length
pub struct Planar<'a, 'b> {
    channels: &'a mut [&'b mut [f32]],
    frames: usize,
}

impl<'a, 'b> Planar<'a, 'b> {
    /// Wrap per-channel slices
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn new(channels: &'a mut [&'b mut [f32]]) -> Self {
        let frames = channels.first().map_or(0, |c| c.len());
        for (index, channel) in channels.iter().enumerate() {
            assert!(
                channel.len() == frames,
                "output channel {} has {} frames, channel 0 has {}",
                index,
                channel.len(),
                frames
            );
        }
        Self { channels, frames }
    }
}

impl OutputBlock for Planar<'_, '_> {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    fn set(&mut self, frame: usize, channel: usize, sample: f32) {
        self.channels[channel][frame] = sample;
    }

    #[inline]
    fn get(&self, frame: usize, channel: usize) -> f32 {
        self.channels[channel][frame]
    }
}

/// A single interleaved slice (`L R L R ...`)
pub struct Interleaved<'a> {
    data: &'a mut [f32],
    channels: usize,
}

impl<'a> Interleaved<'a> {
    /// Wrap an interleaved slice
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero or the slice holds a partial frame.
    pub fn new(data: &'a mut [f32], channels: usize) -> Self {
        assert!(channels > 0, "output block must have at least one channel");
        assert!(
            data.len() % channels == 0,
            "interleaved output of {} samples does not split into {} channels",
            data.len(),
            channels
        );
        Self { data, channels }
    }
}

impl OutputBlock for Interleaved<'_> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    #[inline]
    fn set(&mut self, frame: usize, channel: usize, sample: f32) {
        self.data[frame * self.channels + channel] = sample;
    }

    #[inline]
    fn get(&self, frame: usize, channel: usize) -> f32 {
        self.data[frame * self.channels + channel]
    }
}
