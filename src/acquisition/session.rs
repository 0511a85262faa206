//! Acquisition loop: tick → sample → encode → sink.
//!
//! Single task, busy-polled. The session owns every stage by value and
//! drives them through `&mut self`, so no locking is involved. Any fault
//! ends the session; there is no retry-and-continue.

use std::convert::Infallible;
use std::io::Write;

use super::encoder::FrameEncoder;
use super::sampler::{AnalogInput, Sampler};
use super::tick::{MonotonicClock, TickScheduler};
use crate::config::StreamConfig;
use crate::error::Result;
use crate::protocol::{Marker, DEFAULT_MARKER, MAX_FRAME_SAMPLES};

/// Default device sample rate.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// Settings for an acquisition session.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionConfig {
    /// Samples per second.
    pub sample_rate_hz: u32,
    /// Samples per emitted frame.
    pub frame_samples: u16,
    /// Frame start marker.
    pub marker: Marker,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            frame_samples: MAX_FRAME_SAMPLES,
            marker: DEFAULT_MARKER,
        }
    }
}

impl From<&StreamConfig> for AcquisitionConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            sample_rate_hz: config.sample_rate_hz,
            frame_samples: config.frame_samples,
            marker: config.marker,
        }
    }
}

/// A running acquisition.
pub struct AcquisitionSession<C, A, W> {
    clock: C,
    scheduler: TickScheduler,
    sampler: Sampler<A>,
    encoder: FrameEncoder,
    sink: W,
}

impl<C, A, W> AcquisitionSession<C, A, W>
where
    C: MonotonicClock,
    A: AnalogInput,
    W: Write,
{
    /// Create a session. The first deadline is the clock's current value.
    pub fn new(mut clock: C, input: A, sink: W, config: AcquisitionConfig) -> Result<Self> {
        let encoder = FrameEncoder::new(config.marker, config.frame_samples)?;
        let scheduler = TickScheduler::for_rate(config.sample_rate_hz, clock.now_us())?;

        tracing::debug!(
            "Acquisition at {} Hz (period {} us), {} samples per frame",
            config.sample_rate_hz,
            scheduler.period_us(),
            config.frame_samples
        );

        Ok(Self {
            clock,
            scheduler,
            sampler: Sampler::new(input),
            encoder,
            sink,
        })
    }

    /// Run one iteration of the busy loop.
    ///
    /// Returns `Ok(true)` when this iteration completed and wrote a frame.
    /// Does nothing if the next deadline has not elapsed yet.
    pub fn poll_once(&mut self) -> Result<bool> {
        let now = self.clock.now_us();
        if !self.scheduler.poll(now) {
            return Ok(false);
        }

        let sample = self.sampler.sample()?;
        match self.encoder.observe(sample) {
            Some(frame) => {
                self.sink.write_all(frame)?;
                self.sink.flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run until `frames` more frames have been written.
    pub fn run_frames(&mut self, frames: u64) -> Result<()> {
        let target = self.encoder.frames() + frames;
        while self.encoder.frames() < target {
            self.poll_once()?;
        }
        Ok(())
    }

    /// Run until a fault stops the session.
    pub fn run(&mut self) -> Result<Infallible> {
        loop {
            if let Err(e) = self.poll_once() {
                tracing::error!(
                    "Acquisition stopped after {} frames ({} samples pending lost): {}",
                    self.encoder.frames(),
                    self.encoder.pending(),
                    e
                );
                return Err(e);
            }
        }
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.encoder.frames()
    }

    /// Samples acquired so far.
    pub fn samples_acquired(&self) -> u64 {
        self.scheduler.ticks()
    }

    /// Scheduler state, for diagnostics.
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Stop the session and return the sink.
    pub fn into_sink(self) -> W {
        self.sink
    }
}
