//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management.
//! Implements a state machine for handling fragmented, misaligned streams:
//! - `Seeking`: scanning for the marker, noise is dropped
//! - `WaitingForCount`: marker found, need the 2-byte sample count
//! - `WaitingForPayload`: count parsed, need `count * 2` payload bytes
//!
//! The buffer never holds more than one frame's worth of undecoded bytes
//! beyond what the caller just pushed, so memory stays bounded however long
//! the stream runs.
//!
//! # Example
//!
//! ```
//! use analog_stream::protocol::{build_frame, FrameBuffer, DEFAULT_MARKER};
//!
//! let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
//!
//! let mut chunk = vec![0x13, 0x37]; // line noise
//! chunk.extend(build_frame(DEFAULT_MARKER, &[10, 20, 30]));
//!
//! let frames = buffer.push(&chunk);
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].samples(), &[10, 20, 30]);
//! ```

use bytes::{Buf, BytesMut};

use super::decoder::{decode_checked_count, decode_payload};
use super::frame::SampleFrame;
use super::sync::StreamSynchronizer;
use super::wire_format::{encoded_len, Marker, COUNT_SIZE, MAX_FRAME_SAMPLES, SAMPLE_SIZE};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Scanning for the marker.
    Seeking,
    /// Marker consumed, waiting for the count field.
    WaitingForCount,
    /// Count parsed, waiting for payload bytes.
    WaitingForPayload { sample_count: u16 },
}

/// Running counters for a decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames decoded.
    pub frames: u64,
    /// Samples decoded.
    pub samples: u64,
    /// Bytes dropped while seeking the marker.
    pub discarded_bytes: u64,
    /// Headers rejected for an out-of-range sample count.
    pub invalid_counts: u64,
    /// In-flight frames dropped after a short read or timeout.
    pub dropped_frames: u64,
    /// Read timeouts while seeking a marker.
    pub timeouts: u64,
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes not yet consumed by the state machine.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Marker matcher, also active between frames.
    sync: StreamSynchronizer,
    /// Maximum accepted sample count.
    max_frame_samples: u16,
    stats: DecodeStats,
}

impl FrameBuffer {
    /// Create a frame buffer with the default 512-sample limit.
    pub fn new(marker: Marker) -> Self {
        Self::with_max_samples(marker, MAX_FRAME_SAMPLES)
    }

    /// Create a frame buffer with a custom sample count limit.
    pub fn with_max_samples(marker: Marker, max_frame_samples: u16) -> Self {
        Self {
            buffer: BytesMut::with_capacity(encoded_len(max_frame_samples as usize)),
            state: State::Seeking,
            sync: StreamSynchronizer::new(marker),
            max_frame_samples,
            stats: DecodeStats::default(),
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Chunks may be any size and may split a frame anywhere. Noise before a
    /// marker is dropped. A header with an invalid sample count is treated
    /// as a false marker: the parser goes back to seeking.
    pub fn push(&mut self, data: &[u8]) -> Vec<SampleFrame> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }
        frames
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns `None` when more data is needed.
    fn try_extract_one(&mut self) -> Option<SampleFrame> {
        loop {
            match self.state {
                State::Seeking => {
                    let found = self.sync.scan(&self.buffer);
                    self.stats.discarded_bytes += self.sync.take_discarded();
                    match found {
                        Some(consumed) => {
                            self.buffer.advance(consumed);
                            self.state = State::WaitingForCount;
                        }
                        None => {
                            // Everything was scanned; a half-matched marker
                            // lives in the synchronizer, not the buffer.
                            self.buffer.clear();
                            return None;
                        }
                    }
                }

                State::WaitingForCount => {
                    if self.buffer.len() < COUNT_SIZE {
                        return None;
                    }
                    let count_bytes = [self.buffer[0], self.buffer[1]];
                    self.buffer.advance(COUNT_SIZE);

                    match decode_checked_count(count_bytes, self.max_frame_samples) {
                        Ok(sample_count) => {
                            self.state = State::WaitingForPayload { sample_count };
                        }
                        Err(e) => {
                            tracing::debug!("Rejected frame header: {}", e);
                            self.stats.invalid_counts += 1;
                            self.state = State::Seeking;
                        }
                    }
                }

                State::WaitingForPayload { sample_count } => {
                    let needed = sample_count as usize * SAMPLE_SIZE;
                    if self.buffer.len() < needed {
                        return None;
                    }

                    let payload = self.buffer.split_to(needed);
                    self.state = State::Seeking;

                    // Length was checked above, so this cannot be short.
                    let frame = decode_payload(sample_count, &payload).ok()?;
                    self.stats.frames += 1;
                    self.stats.samples += frame.len() as u64;
                    return Some(frame);
                }
            }
        }
    }

    /// Drop any partially received frame and return to marker seeking.
    ///
    /// Call this when the transport went quiet or closed mid-frame: the
    /// stream can no longer be assumed aligned. Returns `true` if a frame
    /// was in flight.
    pub fn discard_partial(&mut self) -> bool {
        let in_flight = !matches!(self.state, State::Seeking);
        if in_flight {
            self.stats.dropped_frames += 1;
        }
        self.buffer.clear();
        self.sync.reset();
        self.state = State::Seeking;
        in_flight
    }

    /// True while a frame is partially received.
    pub fn has_partial(&self) -> bool {
        !matches!(self.state, State::Seeking)
    }

    /// Decoder counters.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::Seeking => "Seeking",
            State::WaitingForCount => "WaitingForCount",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(Marker::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, DEFAULT_MARKER, HEADER_SIZE};

    fn ramp(len: usize) -> Vec<i16> {
        (0..len as i16).collect()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let frames = buffer.push(&build_frame(DEFAULT_MARKER, &[1, 2, 3]));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[1, 2, 3]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats().frames, 1);
        assert_eq!(buffer.stats().samples, 3);
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);

        let mut combined = Vec::new();
        combined.extend(build_frame(DEFAULT_MARKER, &[1]));
        combined.extend(build_frame(DEFAULT_MARKER, &[2, 2]));
        combined.extend(build_frame(DEFAULT_MARKER, &[3, 3, 3]));

        let frames = buffer.push(&combined);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].samples(), &[1]);
        assert_eq!(frames[1].samples(), &[2, 2]);
        assert_eq!(frames[2].samples(), &[3, 3, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let frame_bytes = build_frame(DEFAULT_MARKER, &[7, 8]);

        assert!(buffer.push(&frame_bytes[..1]).is_empty());
        assert_eq!(buffer.state_name(), "Seeking");

        assert!(buffer.push(&frame_bytes[1..3]).is_empty());
        assert_eq!(buffer.state_name(), "WaitingForCount");

        let frames = buffer.push(&frame_bytes[3..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[7, 8]);
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let samples = ramp(100);
        let frame_bytes = build_frame(DEFAULT_MARKER, &samples);

        let partial_len = HEADER_SIZE + 11;
        assert!(buffer.push(&frame_bytes[..partial_len]).is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");
        assert!(buffer.has_partial());

        let frames = buffer.push(&frame_bytes[partial_len..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &samples[..]);
    }

    #[test]
    fn test_noise_before_frame_is_discarded() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let noise = [0x00, 0x11, 0x55, 0x22, 0xAA, 0x33, 0xFE];
        let samples = ramp(64);

        let mut data = noise.to_vec();
        data.extend(build_frame(DEFAULT_MARKER, &samples));

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &samples[..]);
        assert_eq!(buffer.stats().discarded_bytes, noise.len() as u64);
    }

    #[test]
    fn test_marker_inside_payload_does_not_resync() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        // 0x55AA encodes as AA 55 in little endian.
        let samples = vec![0x55AAu16 as i16, 0x55AAu16 as i16, 3, 0x55AAu16 as i16];

        let mut data = build_frame(DEFAULT_MARKER, &samples);
        data.extend(build_frame(DEFAULT_MARKER, &[9]));

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].samples(), &samples[..]);
        assert_eq!(frames[1].samples(), &[9]);
    }

    #[test]
    fn test_invalid_count_returns_to_seeking() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);

        // Marker followed by a zero count, then a valid frame.
        let mut data = vec![0xAA, 0x55, 0x00, 0x00];
        data.extend(build_frame(DEFAULT_MARKER, &[5, 6]));

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[5, 6]);
        assert_eq!(buffer.stats().invalid_counts, 1);
    }

    #[test]
    fn test_count_above_limit_rejected() {
        let mut buffer = FrameBuffer::with_max_samples(DEFAULT_MARKER, 4);

        let mut data = build_frame(DEFAULT_MARKER, &ramp(5));
        data.extend(build_frame(DEFAULT_MARKER, &ramp(4)));

        let frames = buffer.push(&data);
        assert_eq!(buffer.stats().invalid_counts, 1);
        assert_eq!(frames.last().unwrap().samples(), &ramp(4)[..]);
    }

    #[test]
    fn test_discard_partial_then_recover() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let first = build_frame(DEFAULT_MARKER, &ramp(32));
        let second = build_frame(DEFAULT_MARKER, &ramp(16));

        // First frame truncated by one byte, then the line goes quiet.
        assert!(buffer.push(&first[..first.len() - 1]).is_empty());
        assert!(buffer.discard_partial());
        assert_eq!(buffer.stats().dropped_frames, 1);
        assert_eq!(buffer.state_name(), "Seeking");

        let frames = buffer.push(&second);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &ramp(16)[..]);
    }

    #[test]
    fn test_discard_partial_when_idle() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        assert!(!buffer.discard_partial());
        assert_eq!(buffer.stats().dropped_frames, 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        let frame_bytes = build_frame(DEFAULT_MARKER, &[-1, 1]);

        let mut all_frames = Vec::new();
        for byte in &frame_bytes {
            all_frames.extend(buffer.push(&[*byte]));
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].samples(), &[-1, 1]);
    }

    #[test]
    fn test_buffer_stays_bounded_on_noise() {
        let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
        for _ in 0..1000 {
            buffer.push(&[0x01; 256]);
        }
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats().discarded_bytes, 256_000);
    }
}
