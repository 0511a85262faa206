//! Protocol module - wire format, synchronization, and frame decoding.
//!
//! This module implements the binary sample stream:
//! - 4-byte header (marker + little-endian sample count) encoding/decoding
//! - Two-state marker synchronizer for recovering alignment
//! - Frame buffer for accumulating partial reads
//! - Decoded frame type

mod decoder;
mod frame;
mod frame_buffer;
mod sync;
mod wire_format;

pub use decoder::{decode_checked_count, decode_payload, decode_sample_count};
pub use frame::{build_frame, encode_samples_into, SampleFrame};
pub use frame_buffer::{DecodeStats, FrameBuffer};
pub use sync::{StreamSynchronizer, SyncState};
pub use wire_format::{
    encoded_len, validate_sample_count, FrameHeader, Marker, COUNT_SIZE, DEFAULT_MARKER,
    HEADER_SIZE, MARKER_SIZE, MAX_FRAME_SAMPLES, SAMPLE_SIZE,
};
