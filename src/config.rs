//! Stream configuration.
//!
//! Both ends of the link must agree on sample rate, frame size and marker;
//! nothing is negotiated at runtime. A [`StreamConfig`] is usually left at
//! its defaults or loaded from a small JSON file:
//!
//! ```
//! use analog_stream::config::StreamConfig;
//!
//! let config = StreamConfig::from_json_str(r#"{ "sample_rate_hz": 5000 }"#).unwrap();
//! assert_eq!(config.period_us(), 200);
//! assert_eq!(config.frame_samples, 512);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquisition::{period_for_rate, DEFAULT_SAMPLE_RATE_HZ};
use crate::error::{Result, StreamError};
use crate::history::window_capacity;
use crate::protocol::{Marker, MAX_FRAME_SAMPLES};

/// Default serial device.
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default length of the host's sample history.
pub const DEFAULT_WINDOW_SECONDS: f64 = 5.0;

/// Default host read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;

/// Shared configuration for device and host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Samples per second.
    pub sample_rate_hz: u32,
    /// Samples per frame.
    pub frame_samples: u16,
    /// Frame start marker.
    pub marker: Marker,
    /// Host-side serial device path.
    pub device: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Seconds of samples kept in the host history.
    pub window_seconds: f64,
    /// Host read timeout in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            frame_samples: MAX_FRAME_SAMPLES,
            marker: Marker::default(),
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl StreamConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        period_for_rate(self.sample_rate_hz)?;

        if self.frame_samples == 0 {
            return Err(StreamError::Config(
                "frame_samples must be at least 1".to_string(),
            ));
        }

        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(StreamError::Config(format!(
                "window_seconds must be positive, got {}",
                self.window_seconds
            )));
        }

        if self.read_timeout_ms == 0 {
            return Err(StreamError::Config(
                "read_timeout_ms must be non-zero".to_string(),
            ));
        }

        if self.device.is_empty() {
            return Err(StreamError::Config("device path is empty".to_string()));
        }

        Ok(())
    }

    /// Sample period in microseconds.
    ///
    /// Returns 0 for an unvalidated config with an unusable rate.
    pub fn period_us(&self) -> u32 {
        period_for_rate(self.sample_rate_hz).unwrap_or(0)
    }

    /// Number of samples the host history holds.
    pub fn history_capacity(&self) -> usize {
        window_capacity(self.sample_rate_hz, self.window_seconds)
    }

    /// Host read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
