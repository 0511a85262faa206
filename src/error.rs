//! Error types for analog-stream.

use thiserror::Error;

/// Main error type for all analog-stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error on the transport or sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Hardware read failed on the device; the acquisition session is over.
    #[error("Acquisition fault: {0}")]
    AcquisitionFault(String),

    /// No bytes arrived within the read timeout while seeking a marker.
    #[error("Transport timeout")]
    TransportTimeout,

    /// Transport reached end of stream.
    #[error("Transport closed")]
    TransportClosed,

    /// Transport closed or went quiet before the frame was complete.
    #[error("Short payload: expected {expected} bytes, received {received}")]
    ShortPayload {
        /// Bytes the count field or payload required.
        expected: usize,
        /// Bytes actually received.
        received: usize,
    },

    /// Header declared a sample count outside `1..=max`.
    #[error("Invalid sample count {count} (allowed 1..={max})")]
    InvalidSampleCount {
        /// Declared count.
        count: u16,
        /// Configured maximum.
        max: u16,
    },
}

impl StreamError {
    /// True for faults that only cost the current frame.
    ///
    /// The decode loop discards the frame, reseeks the marker and keeps going.
    pub fn is_frame_fault(&self) -> bool {
        matches!(
            self,
            StreamError::TransportTimeout
                | StreamError::ShortPayload { .. }
                | StreamError::InvalidSampleCount { .. }
        )
    }
}

/// Result type alias using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_fault_classification() {
        assert!(StreamError::TransportTimeout.is_frame_fault());
        assert!(StreamError::ShortPayload {
            expected: 1024,
            received: 1023
        }
        .is_frame_fault());
        assert!(StreamError::InvalidSampleCount { count: 0, max: 512 }.is_frame_fault());

        assert!(!StreamError::TransportClosed.is_frame_fault());
        assert!(!StreamError::AcquisitionFault("adc".into()).is_frame_fault());
    }

    #[test]
    fn test_display_messages() {
        let err = StreamError::ShortPayload {
            expected: 1024,
            received: 10,
        };
        assert_eq!(
            err.to_string(),
            "Short payload: expected 1024 bytes, received 10"
        );

        let err = StreamError::InvalidSampleCount {
            count: 600,
            max: 512,
        };
        assert!(err.to_string().contains("600"));
    }
}
