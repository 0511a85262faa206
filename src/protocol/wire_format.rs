//! Wire format encoding and decoding.
//!
//! Implements the 4-byte frame header followed by the sample payload:
//! ```text
//! ┌──────────┬──────────────┬──────────────────────────┐
//! │ Marker   │ Sample count │ Payload                  │
//! │ 2 bytes  │ uint16 LE    │ count × int16 LE         │
//! │ AA 55    │              │                          │
//! └──────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian. There is no trailer, checksum
//! or version field; frames are concatenated back to back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Marker size in bytes.
pub const MARKER_SIZE: usize = 2;

/// Size of the sample count field.
pub const COUNT_SIZE: usize = 2;

/// Header size in bytes (marker + count).
pub const HEADER_SIZE: usize = MARKER_SIZE + COUNT_SIZE;

/// Size of one encoded sample.
pub const SAMPLE_SIZE: usize = 2;

/// Default upper bound on samples per frame.
pub const MAX_FRAME_SAMPLES: u16 = 512;

/// Two-byte frame start marker.
///
/// The synchronizer is a non-overlapping two-state scan, which is only
/// correct when the two bytes differ. Construction enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct Marker([u8; MARKER_SIZE]);

/// Default marker, `0xAA 0x55`.
pub const DEFAULT_MARKER: Marker = Marker([0xAA, 0x55]);

impl Marker {
    /// Create a marker from its two bytes.
    ///
    /// Returns a config error if both bytes are equal.
    pub fn new(first: u8, second: u8) -> Result<Self> {
        if first == second {
            return Err(StreamError::Config(format!(
                "Marker bytes must differ, got 0x{:02X} 0x{:02X}",
                first, second
            )));
        }
        Ok(Self([first, second]))
    }

    /// First byte on the wire.
    #[inline]
    pub fn first(&self) -> u8 {
        self.0[0]
    }

    /// Second byte on the wire.
    #[inline]
    pub fn second(&self) -> u8 {
        self.0[1]
    }

    /// Both bytes in wire order.
    #[inline]
    pub fn bytes(&self) -> [u8; MARKER_SIZE] {
        self.0
    }
}

impl Default for Marker {
    fn default() -> Self {
        DEFAULT_MARKER
    }
}

impl TryFrom<[u8; 2]> for Marker {
    type Error = StreamError;

    fn try_from(bytes: [u8; 2]) -> Result<Self> {
        Marker::new(bytes[0], bytes[1])
    }
}

impl From<Marker> for [u8; 2] {
    fn from(marker: Marker) -> Self {
        marker.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.0[0], self.0[1])
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Marker the frame started with.
    pub marker: Marker,
    /// Number of samples in the payload.
    pub sample_count: u16,
}

impl FrameHeader {
    /// Create a new header.
    pub fn new(marker: Marker, sample_count: u16) -> Self {
        Self {
            marker,
            sample_count,
        }
    }

    /// Encode header to bytes (Little Endian count).
    ///
    /// # Example
    ///
    /// ```
    /// use analog_stream::protocol::{FrameHeader, DEFAULT_MARKER};
    ///
    /// let header = FrameHeader::new(DEFAULT_MARKER, 512);
    /// assert_eq!(header.encode(), [0xAA, 0x55, 0x00, 0x02]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (4 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[..MARKER_SIZE].copy_from_slice(&self.marker.bytes());
        buf[MARKER_SIZE..HEADER_SIZE].copy_from_slice(&self.sample_count.to_le_bytes());
    }

    /// Decode a header, checking the marker.
    ///
    /// Returns `None` if the buffer is too short or does not start with
    /// `marker`.
    pub fn decode(buf: &[u8], marker: Marker) -> Option<Self> {
        if buf.len() < HEADER_SIZE || buf[..MARKER_SIZE] != marker.bytes() {
            return None;
        }
        Some(Self {
            marker,
            sample_count: u16::from_le_bytes([buf[2], buf[3]]),
        })
    }

    /// Payload length in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.sample_count as usize * SAMPLE_SIZE
    }

    /// Total encoded frame length.
    #[inline]
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload_len()
    }

    /// Validate the sample count against `1..=max_samples`.
    pub fn validate(&self, max_samples: u16) -> Result<()> {
        validate_sample_count(self.sample_count, max_samples)
    }
}

/// Check a declared sample count against `1..=max_samples`.
#[inline]
pub fn validate_sample_count(count: u16, max_samples: u16) -> Result<()> {
    if count == 0 || count > max_samples {
        return Err(StreamError::InvalidSampleCount {
            count,
            max: max_samples,
        });
    }
    Ok(())
}

/// Encoded length of a frame holding `sample_count` samples.
#[inline]
pub fn encoded_len(sample_count: usize) -> usize {
    HEADER_SIZE + sample_count * SAMPLE_SIZE
}
