//! Sliding window of recent samples.
//!
//! The decode path appends every frame; the render path reads the window at
//! its own pace. Capacity is fixed at `sample_rate_hz * window_seconds`, and
//! the oldest samples are evicted first.
//!
//! # Example
//!
//! ```
//! use analog_stream::history::SampleHistory;
//!
//! let mut history = SampleHistory::new(4, 1_000);
//! history.extend(&[1, 2, 3]);
//! history.extend(&[4, 5, 6]);
//! assert_eq!(history.snapshot(), vec![3, 4, 5, 6]);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::StreamConfig;

/// Full-scale divisor for normalizing int16 samples.
pub const FULL_SCALE: f32 = 32_768.0;

/// Samples held by a window of `window_seconds` at `sample_rate_hz`.
pub fn window_capacity(sample_rate_hz: u32, window_seconds: f64) -> usize {
    (sample_rate_hz as f64 * window_seconds) as usize
}

/// Normalize samples to `-1.0..1.0`.
pub fn to_normalized(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / FULL_SCALE).collect()
}

/// Fixed-capacity FIFO of samples.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<i16>,
    capacity: usize,
    sample_rate_hz: u32,
    /// Samples ever appended, including evicted ones.
    total: u64,
}

impl SampleHistory {
    /// Create a window holding at most `capacity` samples.
    pub fn new(capacity: usize, sample_rate_hz: u32) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sample_rate_hz,
            total: 0,
        }
    }

    /// Create a window covering `window_seconds` of signal.
    pub fn for_window(sample_rate_hz: u32, window_seconds: f64) -> Self {
        Self::new(window_capacity(sample_rate_hz, window_seconds), sample_rate_hz)
    }

    /// Create a window sized from a stream config.
    pub fn for_config(config: &StreamConfig) -> Self {
        Self::for_window(config.sample_rate_hz, config.window_seconds)
    }

    /// Append samples in order, evicting the oldest beyond capacity.
    pub fn extend(&mut self, samples: &[i16]) {
        self.total += samples.len() as u64;

        if self.capacity == 0 {
            return;
        }

        // Only the newest `capacity` of the incoming samples can survive.
        let incoming = &samples[samples.len().saturating_sub(self.capacity)..];
        let overflow = (self.samples.len() + incoming.len()).saturating_sub(self.capacity);
        self.samples.drain(..overflow);
        self.samples.extend(incoming);
    }

    /// Copy the window out, oldest first.
    pub fn snapshot(&self) -> Vec<i16> {
        self.samples.iter().copied().collect()
    }

    /// `(seconds, amplitude)` points for plotting, amplitude in `-1.0..1.0`.
    ///
    /// Time runs from 0 at the oldest retained sample.
    pub fn timeline(&self) -> Vec<(f64, f32)> {
        let rate = self.sample_rate_hz.max(1) as f64;
        self.samples
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as f64 / rate, s as f32 / FULL_SCALE))
            .collect()
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples ever appended.
    pub fn total_appended(&self) -> u64 {
        self.total
    }

    /// Seconds of signal currently held.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate_hz.max(1) as f64)
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

struct Shared {
    history: SampleHistory,
    last_append: Option<Instant>,
}

/// [`SampleHistory`] shared between the decode and render paths.
///
/// Cloning is cheap; all clones refer to the same window.
#[derive(Clone)]
pub struct SharedHistory {
    inner: Arc<Mutex<Shared>>,
}

impl SharedHistory {
    /// Wrap a window for sharing.
    pub fn new(history: SampleHistory) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared {
                history,
                last_append: None,
            })),
        }
    }

    /// Append one decoded frame's samples.
    pub fn append(&self, samples: &[i16]) {
        let mut shared = self.inner.lock();
        shared.history.extend(samples);
        shared.last_append = Some(Instant::now());
    }

    /// Copy the window out, oldest first.
    pub fn snapshot(&self) -> Vec<i16> {
        self.inner.lock().history.snapshot()
    }

    /// Plot points for the current window.
    pub fn timeline(&self) -> Vec<(f64, f32)> {
        self.inner.lock().history.timeline()
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// True if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().history.is_empty()
    }

    /// Samples ever appended.
    pub fn total_appended(&self) -> u64 {
        self.inner.lock().history.total_appended()
    }

    /// Time since the last append, `None` before the first one.
    ///
    /// Render loops use this to report a stalled stream.
    pub fn since_last_append(&self) -> Option<Duration> {
        self.inner.lock().last_append.map(|at| at.elapsed())
    }

    /// Run `f` with the window locked.
    pub fn with<T>(&self, f: impl FnOnce(&SampleHistory) -> T) -> T {
        f(&self.inner.lock().history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_most_recent_in_order() {
        let mut history = SampleHistory::new(5, 1_000);
        for chunk in (0..12).collect::<Vec<i16>>().chunks(3) {
            history.extend(chunk);
        }
        assert_eq!(history.snapshot(), vec![7, 8, 9, 10, 11]);
        assert_eq!(history.len(), 5);
        assert_eq!(history.total_appended(), 12);
    }

    #[test]
    fn test_single_append_larger_than_capacity() {
        let mut history = SampleHistory::new(3, 1_000);
        history.extend(&[9, 9]);
        history.extend(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(history.snapshot(), vec![4, 5, 6]);
    }

    #[test]
    fn test_under_capacity() {
        let mut history = SampleHistory::new(10, 1_000);
        history.extend(&[1, 2]);
        assert_eq!(history.snapshot(), vec![1, 2]);
        assert_eq!(history.capacity(), 10);
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut history = SampleHistory::new(0, 1_000);
        history.extend(&[1, 2, 3]);
        assert!(history.is_empty());
        assert_eq!(history.total_appended(), 3);
    }

    #[test]
    fn test_capacity_from_config() {
        let config = StreamConfig {
            sample_rate_hz: 5_000,
            window_seconds: 2.0,
            ..StreamConfig::default()
        };
        assert_eq!(SampleHistory::for_config(&config).capacity(), 10_000);
        assert_eq!(config.history_capacity(), 10_000);
        assert_eq!(SampleHistory::for_window(44_100, 0.5).capacity(), 22_050);
    }

    #[test]
    fn test_timeline_and_duration() {
        let mut history = SampleHistory::new(8, 4);
        history.extend(&[0, 16_384, -32_768]);

        let points = history.timeline();
        assert_eq!(points, vec![(0.0, 0.0), (0.25, 0.5), (0.5, -1.0)]);
        assert_eq!(history.duration(), Duration::from_millis(750));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(to_normalized(&[0, -32_768, 16_384]), vec![0.0, -1.0, 0.5]);
    }

    #[test]
    fn test_shared_history_across_threads() {
        let shared = SharedHistory::new(SampleHistory::new(1_000, 1_000));
        assert!(shared.since_last_append().is_none());

        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..100i16 {
                writer.append(&[i; 20]);
            }
        });
        handle.join().unwrap();

        assert_eq!(shared.len(), 1_000);
        assert_eq!(shared.total_appended(), 2_000);
        assert!(shared.since_last_append().is_some());

        // Last 50 appends survive, in order.
        let snapshot = shared.snapshot();
        assert_eq!(snapshot[0], 50);
        assert_eq!(snapshot[999], 99);
        assert!(snapshot.windows(2).all(|w| w[0] <= w[1]));
    }
}
