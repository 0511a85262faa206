//! Marker synchronizer.
//!
//! Scans a byte stream for the two-byte frame marker with a two-state
//! matcher. The scan is non-overlapping: a byte that breaks a half-matched
//! marker is dropped, not re-examined as a possible first byte. This is
//! correct because marker bytes are always distinct (see [`Marker::new`]).
//!
//! # Example
//!
//! ```
//! use analog_stream::protocol::{StreamSynchronizer, DEFAULT_MARKER};
//!
//! let mut sync = StreamSynchronizer::new(DEFAULT_MARKER);
//! let data = [0x00, 0x13, 0xAA, 0x55, 0x00, 0x02];
//!
//! // Consumed up to and including the marker.
//! assert_eq!(sync.scan(&data), Some(4));
//! ```

use super::wire_format::Marker;

/// Matcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Waiting for the marker's first byte.
    SeekingFirstMarkerByte,
    /// First byte seen, waiting for the second.
    SeekingSecondMarkerByte,
}

/// Two-state marker matcher.
#[derive(Debug, Clone)]
pub struct StreamSynchronizer {
    marker: Marker,
    state: SyncState,
    /// Bytes thrown away since the last completed marker.
    discarded: u64,
}

impl StreamSynchronizer {
    /// Create a synchronizer for `marker`.
    pub fn new(marker: Marker) -> Self {
        Self {
            marker,
            state: SyncState::SeekingFirstMarkerByte,
            discarded: 0,
        }
    }

    /// Feed one byte. Returns `true` when it completes the marker.
    ///
    /// After a match the synchronizer is back in
    /// [`SyncState::SeekingFirstMarkerByte`], ready for the next frame.
    #[inline]
    pub fn feed(&mut self, byte: u8) -> bool {
        match self.state {
            SyncState::SeekingFirstMarkerByte => {
                if byte == self.marker.first() {
                    self.state = SyncState::SeekingSecondMarkerByte;
                } else {
                    self.discarded += 1;
                }
                false
            }
            SyncState::SeekingSecondMarkerByte => {
                self.state = SyncState::SeekingFirstMarkerByte;
                if byte == self.marker.second() {
                    true
                } else {
                    // The half-matched first byte is lost too.
                    self.discarded += 2;
                    false
                }
            }
        }
    }

    /// Feed a chunk byte by byte.
    ///
    /// Returns `Some(n)` where `n` is the number of bytes consumed up to and
    /// including the marker, or `None` if the whole chunk was consumed
    /// without completing one. Partial progress carries over to the next call.
    pub fn scan(&mut self, data: &[u8]) -> Option<usize> {
        data.iter()
            .position(|&b| self.feed(b))
            .map(|index| index + 1)
    }

    /// Current matcher state.
    #[inline]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Marker this synchronizer looks for.
    #[inline]
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Number of bytes discarded since the last call to `take_discarded`.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Return and reset the discarded byte counter.
    #[inline]
    pub fn take_discarded(&mut self) -> u64 {
        std::mem::take(&mut self.discarded)
    }

    /// Forget any half-matched marker.
    pub fn reset(&mut self) {
        self.state = SyncState::SeekingFirstMarkerByte;
    }
}
