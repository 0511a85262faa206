//! Decoded sample frame and frame building.
//!
//! A [`SampleFrame`] only exists once its whole payload has been decoded;
//! the host never hands out partially filled frames.
//!
//! # Example
//!
//! ```
//! use analog_stream::protocol::{build_frame, SampleFrame, DEFAULT_MARKER};
//!
//! let bytes = build_frame(DEFAULT_MARKER, &[1, -1]);
//! assert_eq!(bytes, [0xAA, 0x55, 0x02, 0x00, 0x01, 0x00, 0xFF, 0xFF]);
//!
//! let frame = SampleFrame::new(vec![1, -1]);
//! assert_eq!(frame.len(), 2);
//! ```

use super::wire_format::{encoded_len, FrameHeader, Marker, HEADER_SIZE, SAMPLE_SIZE};

/// A complete, decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFrame {
    /// Samples in the order they were acquired.
    pub samples: Vec<i16>,
}

impl SampleFrame {
    /// Create a frame from decoded samples.
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Borrow the samples.
    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Take ownership of the samples.
    #[inline]
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the frame holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value, 0 for an empty frame.
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}

/// Encode samples as little-endian int16 into `buf`.
///
/// # Panics
///
/// Panics if `buf` is shorter than `samples.len() * 2`.
pub fn encode_samples_into(buf: &mut [u8], samples: &[i16]) {
    debug_assert!(buf.len() >= samples.len() * SAMPLE_SIZE);
    for (chunk, sample) in buf.chunks_exact_mut(SAMPLE_SIZE).zip(samples) {
        chunk.copy_from_slice(&sample.to_le_bytes());
    }
}

/// Build a complete frame as a single byte vector.
///
/// `samples.len()` must fit in a `u16`; the count field is truncated
/// otherwise (debug builds assert).
pub fn build_frame(marker: Marker, samples: &[i16]) -> Vec<u8> {
    debug_assert!(samples.len() <= u16::MAX as usize);
    let header = FrameHeader::new(marker, samples.len() as u16);

    let mut buf = vec![0u8; encoded_len(samples.len())];
    header.encode_into(&mut buf);
    encode_samples_into(&mut buf[HEADER_SIZE..], samples);
    buf
}
