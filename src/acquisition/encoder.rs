//! Fixed-size frame encoder.
//!
//! Samples are written straight into a pre-built frame image whose marker
//! and count are filled in once at construction. When the image is full it
//! is handed out as a slice and the write index goes back to zero; the same
//! storage is overwritten by the next frame.
//!
//! Only full frames are ever emitted. Samples still pending when the session
//! stops are lost.
//!
//! # Example
//!
//! ```
//! use analog_stream::acquisition::FrameEncoder;
//! use analog_stream::protocol::DEFAULT_MARKER;
//!
//! let mut encoder = FrameEncoder::new(DEFAULT_MARKER, 2).unwrap();
//! assert!(encoder.observe(1).is_none());
//!
//! let frame = encoder.observe(-1).unwrap();
//! assert_eq!(frame, &[0xAA, 0x55, 0x02, 0x00, 0x01, 0x00, 0xFF, 0xFF]);
//! ```

use crate::error::{Result, StreamError};
use crate::protocol::{encoded_len, FrameHeader, Marker, HEADER_SIZE, SAMPLE_SIZE};

/// Accumulates samples into full frames.
pub struct FrameEncoder {
    /// Header followed by `frame_samples` sample slots.
    image: Vec<u8>,
    frame_samples: usize,
    /// Next sample slot to write.
    index: usize,
    frames: u64,
}

impl FrameEncoder {
    /// Create an encoder emitting frames of `frame_samples` samples.
    pub fn new(marker: Marker, frame_samples: u16) -> Result<Self> {
        if frame_samples == 0 {
            return Err(StreamError::Config(
                "Frame size must be at least one sample".to_string(),
            ));
        }

        let mut image = vec![0u8; encoded_len(frame_samples as usize)];
        FrameHeader::new(marker, frame_samples).encode_into(&mut image);

        Ok(Self {
            image,
            frame_samples: frame_samples as usize,
            index: 0,
            frames: 0,
        })
    }

    /// Append one sample.
    ///
    /// Returns the complete encoded frame when this sample fills it. The
    /// slice borrows the encoder's storage and must be written out before
    /// the next call.
    pub fn observe(&mut self, sample: i16) -> Option<&[u8]> {
        let offset = HEADER_SIZE + self.index * SAMPLE_SIZE;
        self.image[offset..offset + SAMPLE_SIZE].copy_from_slice(&sample.to_le_bytes());
        self.index += 1;

        if self.index < self.frame_samples {
            return None;
        }

        self.index = 0;
        self.frames += 1;
        Some(&self.image)
    }

    /// Samples buffered toward the next frame.
    #[inline]
    pub fn pending(&self) -> usize {
        self.index
    }

    /// Samples per frame.
    #[inline]
    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Encoded size of every emitted frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.image.len()
    }

    /// Frames emitted so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, DEFAULT_MARKER};

    #[test]
    fn test_zero_frame_size_rejected() {
        assert!(FrameEncoder::new(DEFAULT_MARKER, 0).is_err());
    }

    #[test]
    fn test_counting_frame_reference_bytes() {
        let mut encoder = FrameEncoder::new(DEFAULT_MARKER, 512).unwrap();

        for i in 0..511 {
            assert!(encoder.observe(i).is_none());
        }
        let frame = encoder.observe(511).unwrap().to_vec();

        assert_eq!(&frame[..4], &[0xAA, 0x55, 0x00, 0x02]);
        assert_eq!(&frame[4..8], &[0x00, 0x00, 0x01, 0x00]);
        assert_eq!(frame.len(), 4 + 512 * 2);

        let expected: Vec<i16> = (0..512).collect();
        assert_eq!(frame, build_frame(DEFAULT_MARKER, &expected));
    }

    #[test]
    fn test_storage_reused_between_frames() {
        let mut encoder = FrameEncoder::new(DEFAULT_MARKER, 3).unwrap();

        encoder.observe(1);
        encoder.observe(2);
        let first_ptr = encoder.observe(3).unwrap().as_ptr();

        encoder.observe(4);
        encoder.observe(5);
        let second = encoder.observe(6).unwrap();

        assert_eq!(second.as_ptr(), first_ptr);
        assert_eq!(second, build_frame(DEFAULT_MARKER, &[4, 5, 6]).as_slice());
        assert_eq!(encoder.frames(), 2);
    }

    #[test]
    fn test_partial_frame_is_never_emitted() {
        let mut encoder = FrameEncoder::new(DEFAULT_MARKER, 4).unwrap();
        for s in 0..3 {
            assert!(encoder.observe(s).is_none());
        }
        assert_eq!(encoder.pending(), 3);
        assert_eq!(encoder.frames(), 0);
    }

    #[test]
    fn test_custom_marker_in_header() {
        let marker = Marker::new(0x7E, 0x81).unwrap();
        let mut encoder = FrameEncoder::new(marker, 1).unwrap();
        let frame = encoder.observe(0).unwrap();
        assert_eq!(&frame[..4], &[0x7E, 0x81, 0x01, 0x00]);
    }
}
