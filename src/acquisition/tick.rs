//! Drift-free tick scheduling on a wrapping microsecond counter.
//!
//! Deadlines advance from the previous deadline, never from "now": a late
//! tick delays that one sample but does not shift the ones after it.
//!
//! The counter is a `u32` that wraps every ~71.6 minutes. All comparisons go
//! through [`ticks_diff`], which is correct across the wrap as long as the
//! two instants are less than 2^31 µs apart.
//!
//! # Example
//!
//! ```
//! use analog_stream::acquisition::{period_for_rate, TickScheduler};
//!
//! let period = period_for_rate(5_000).unwrap();
//! assert_eq!(period, 200);
//!
//! let mut ticks = TickScheduler::new(period, 1_000);
//! assert!(!ticks.poll(999));
//! assert!(ticks.poll(1_000));
//! assert_eq!(ticks.next_deadline(), 1_200);
//! ```

use crate::error::{Result, StreamError};

/// Microseconds per second.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// Source of a free-running microsecond counter.
pub trait MonotonicClock {
    /// Current counter value. Wraps to zero after `u32::MAX`.
    fn now_us(&mut self) -> u32;
}

/// Sample period in whole microseconds, `⌊1_000_000 / rate⌋`.
///
/// Rates of 0 or above 1 MHz have no usable period.
pub fn period_for_rate(sample_rate_hz: u32) -> Result<u32> {
    if sample_rate_hz == 0 || sample_rate_hz > MICROS_PER_SECOND {
        return Err(StreamError::Config(format!(
            "Sample rate {} Hz outside 1..={}",
            sample_rate_hz, MICROS_PER_SECOND
        )));
    }
    Ok(MICROS_PER_SECOND / sample_rate_hz)
}

/// Add a duration to a counter value, wrapping.
#[inline]
pub fn ticks_add(ticks: u32, delta: u32) -> u32 {
    ticks.wrapping_add(delta)
}

/// Signed distance `a - b` on the wrapping counter.
///
/// Positive when `a` is after `b`.
#[inline]
pub fn ticks_diff(a: u32, b: u32) -> i32 {
    a.wrapping_sub(b) as i32
}

/// Computes sample deadlines.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period_us: u32,
    next_deadline: u32,
    ticks: u64,
}

impl TickScheduler {
    /// Create a scheduler whose first deadline is `start`.
    pub fn new(period_us: u32, start: u32) -> Self {
        Self {
            period_us,
            next_deadline: start,
            ticks: 0,
        }
    }

    /// Create a scheduler for a sample rate.
    pub fn for_rate(sample_rate_hz: u32, start: u32) -> Result<Self> {
        Ok(Self::new(period_for_rate(sample_rate_hz)?, start))
    }

    /// Check the deadline against `now`.
    ///
    /// Returns `true` if the deadline has elapsed, in which case the next
    /// deadline is one period after the one that just fired.
    #[inline]
    pub fn poll(&mut self, now: u32) -> bool {
        if ticks_diff(now, self.next_deadline) < 0 {
            return false;
        }
        self.next_deadline = ticks_add(self.next_deadline, self.period_us);
        self.ticks += 1;
        true
    }

    /// How far `now` is past the pending deadline, 0 if not yet due.
    #[inline]
    pub fn lateness(&self, now: u32) -> u32 {
        ticks_diff(now, self.next_deadline).max(0) as u32
    }

    /// The deadline that has not fired yet.
    #[inline]
    pub fn next_deadline(&self) -> u32 {
        self.next_deadline
    }

    /// Sample period in microseconds.
    #[inline]
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Deadlines fired so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
