//! Frame body decoding.
//!
//! Pure functions shared by the incremental [`FrameBuffer`](super::FrameBuffer)
//! and the async [`FrameReader`](crate::reader::FrameReader). Decoding goes
//! by byte count only; marker bytes inside a payload are just sample data.

use super::frame::SampleFrame;
use super::wire_format::{validate_sample_count, COUNT_SIZE, SAMPLE_SIZE};
use crate::error::{Result, StreamError};

/// Decode the little-endian sample count field.
#[inline]
pub fn decode_sample_count(bytes: [u8; COUNT_SIZE]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Decode the count field and check it against `1..=max_samples`.
pub fn decode_checked_count(bytes: [u8; COUNT_SIZE], max_samples: u16) -> Result<u16> {
    let count = decode_sample_count(bytes);
    validate_sample_count(count, max_samples)?;
    Ok(count)
}

/// Reinterpret a complete payload as little-endian int16 samples.
///
/// `payload` must hold exactly `sample_count * 2` bytes; anything shorter is
/// a [`StreamError::ShortPayload`] and no samples are returned.
pub fn decode_payload(sample_count: u16, payload: &[u8]) -> Result<SampleFrame> {
    let expected = sample_count as usize * SAMPLE_SIZE;
    if payload.len() != expected {
        return Err(StreamError::ShortPayload {
            expected,
            received: payload.len(),
        });
    }

    let samples = payload
        .chunks_exact(SAMPLE_SIZE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(SampleFrame::new(samples))
}
