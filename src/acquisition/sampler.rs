//! One ADC read per tick, converted to a signed sample.
//!
//! # Sample mapping
//!
//! Raw readings are unsigned 16-bit, full scale `0..=65535`. They are
//! center-shifted to signed by subtracting the half-scale midpoint:
//!
//! ```text
//! sample = raw - 32768        0 -> -32768, 32768 -> 0, 65535 -> 32767
//! ```
//!
//! This is the only mapping the stream uses. The wire carries no indicator
//! of the convention, so hosts must assume it.

use std::fmt;

use crate::error::{Result, StreamError};

/// Half-scale midpoint of an unsigned 16-bit reading.
pub const ADC_MIDPOINT: i32 = 32_768;

/// A blocking analog input.
pub trait AnalogInput {
    /// Hardware error type.
    type Error: fmt::Display;

    /// Read one unsigned 16-bit value. May block briefly.
    fn read_u16(&mut self) -> std::result::Result<u16, Self::Error>;
}

/// Center-shift a raw unsigned reading into a signed sample.
#[inline]
pub fn to_sample(raw: u16) -> i16 {
    (raw as i32 - ADC_MIDPOINT) as i16
}

/// Reads samples from an [`AnalogInput`].
pub struct Sampler<A> {
    input: A,
}

impl<A: AnalogInput> Sampler<A> {
    /// Wrap an input.
    pub fn new(input: A) -> Self {
        Self { input }
    }

    /// Perform exactly one read.
    ///
    /// A hardware failure becomes [`StreamError::AcquisitionFault`]; it is
    /// never retried.
    pub fn sample(&mut self) -> Result<i16> {
        self.input
            .read_u16()
            .map(to_sample)
            .map_err(|e| StreamError::AcquisitionFault(e.to_string()))
    }

    /// Borrow the underlying input.
    pub fn input(&self) -> &A {
        &self.input
    }

    /// Give back the underlying input.
    pub fn into_inner(self) -> A {
        self.input
    }
}
