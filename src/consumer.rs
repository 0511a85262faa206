//! Consumer seam: where decoded samples leave the core.
//!
//! Playback, plotting and persistence live behind [`SampleConsumer`]. The
//! receiver calls it once per decoded frame, in decode order, from a
//! dedicated blocking thread, so an implementation may block (e.g. on an
//! audio device write) without stalling decoding.
//!
//! # Example
//!
//! ```
//! use analog_stream::consumer::SampleConsumer;
//!
//! let mut total = 0usize;
//! let mut count = |samples: &[i16]| total += samples.len();
//! count.accept(&[1, 2, 3]);
//! ```

/// Accepts decoded sample sequences.
///
/// Samples are signed 16-bit at the configured stream rate.
pub trait SampleConsumer: Send {
    /// Take one frame's samples.
    fn accept(&mut self, samples: &[i16]);

    /// Called once after the last frame, when the stream has ended.
    fn finish(&mut self) {}
}

impl<F> SampleConsumer for F
where
    F: FnMut(&[i16]) + Send,
{
    fn accept(&mut self, samples: &[i16]) {
        self(samples)
    }
}

/// Consumer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardConsumer;

impl SampleConsumer for DiscardConsumer {
    fn accept(&mut self, _samples: &[i16]) {}
}

/// Consumer that keeps every sample in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingConsumer {
    samples: Vec<i16>,
    frames: usize,
}

impl CollectingConsumer {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything accepted so far, in order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of frames accepted.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl SampleConsumer for CollectingConsumer {
    fn accept(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
        self.frames += 1;
    }
}
