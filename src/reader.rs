//! Async frame reader over a transport.
//!
//! [`FrameReader::read_frame`] runs the full host-side sequence for one
//! frame: seek the marker, read the 2-byte count, read exactly `count * 2`
//! payload bytes, reinterpret as samples. Every transport read is bounded
//! by the configured timeout so callers are never blocked indefinitely.
//!
//! Fault handling:
//! - timeout while seeking → [`StreamError::TransportTimeout`]; call again to
//!   keep polling
//! - end of stream while seeking → [`StreamError::TransportClosed`]
//! - timeout or end of stream mid-frame → [`StreamError::ShortPayload`]; the
//!   partial frame is dropped and the next call reseeks the marker
//! - out-of-range count → [`StreamError::InvalidSampleCount`]; next call
//!   reseeks
//!
//! # Example
//!
//! ```ignore
//! use analog_stream::reader::FrameReader;
//! use analog_stream::protocol::DEFAULT_MARKER;
//!
//! let mut reader = FrameReader::new(device, DEFAULT_MARKER);
//! loop {
//!     match reader.read_frame().await {
//!         Ok(frame) => println!("{} samples", frame.len()),
//!         Err(e) if e.is_frame_fault() => continue,
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{StreamConfig, DEFAULT_READ_TIMEOUT_MS};
use crate::error::{Result, StreamError};
use crate::protocol::{
    decode_checked_count, decode_payload, encoded_len, DecodeStats, Marker, SampleFrame,
    StreamSynchronizer, COUNT_SIZE, MAX_FRAME_SAMPLES, SAMPLE_SIZE,
};

/// Default read chunk size.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for a [`FrameReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Longest wait for any single transport read.
    pub read_timeout: Duration,
    /// Largest sample count accepted in a header.
    pub max_frame_samples: u16,
    /// Bytes requested per transport read.
    pub read_chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            max_frame_samples: MAX_FRAME_SAMPLES,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl From<&StreamConfig> for ReaderConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            max_frame_samples: config.frame_samples.max(MAX_FRAME_SAMPLES),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Outcome of one bounded transport read.
enum Fill {
    Data,
    Closed,
    TimedOut,
}

/// Pulls frames off an async byte stream.
pub struct FrameReader<R> {
    reader: R,
    /// Bytes read but not yet consumed.
    buffer: BytesMut,
    sync: StreamSynchronizer,
    config: ReaderConfig,
    stats: DecodeStats,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with default configuration.
    pub fn new(reader: R, marker: Marker) -> Self {
        Self::with_config(reader, marker, ReaderConfig::default())
    }

    /// Create a reader with custom configuration.
    pub fn with_config(reader: R, marker: Marker, config: ReaderConfig) -> Self {
        let capacity = encoded_len(config.max_frame_samples as usize).max(config.read_chunk_size);
        Self {
            reader,
            buffer: BytesMut::with_capacity(capacity),
            sync: StreamSynchronizer::new(marker),
            config,
            stats: DecodeStats::default(),
        }
    }

    /// Read the next complete frame.
    pub async fn read_frame(&mut self) -> Result<SampleFrame> {
        self.sync_to_marker().await?;

        match self.read_body().await {
            Ok(frame) => {
                self.stats.frames += 1;
                self.stats.samples += frame.len() as u64;
                Ok(frame)
            }
            Err(e) => {
                match e {
                    StreamError::InvalidSampleCount { .. } => self.stats.invalid_counts += 1,
                    _ => self.stats.dropped_frames += 1,
                }
                tracing::debug!("Dropped frame: {}", e);
                Err(e)
            }
        }
    }

    /// Consume bytes up to and including the next marker.
    async fn sync_to_marker(&mut self) -> Result<()> {
        loop {
            let found = self.sync.scan(&self.buffer);
            let discarded = self.sync.take_discarded();
            if discarded > 0 {
                tracing::trace!("Discarded {} bytes while seeking marker", discarded);
                self.stats.discarded_bytes += discarded;
            }

            if let Some(consumed) = found {
                self.buffer.advance(consumed);
                return Ok(());
            }
            self.buffer.clear();

            match self.fill().await? {
                Fill::Data => {}
                Fill::Closed => return Err(StreamError::TransportClosed),
                Fill::TimedOut => {
                    self.stats.timeouts += 1;
                    return Err(StreamError::TransportTimeout);
                }
            }
        }
    }

    /// Read count and payload after a marker.
    async fn read_body(&mut self) -> Result<SampleFrame> {
        let count_bytes = self.read_exact(COUNT_SIZE).await?;
        let sample_count =
            decode_checked_count([count_bytes[0], count_bytes[1]], self.config.max_frame_samples)?;

        let payload = self.read_exact(sample_count as usize * SAMPLE_SIZE).await?;
        decode_payload(sample_count, &payload)
    }

    /// Take exactly `n` bytes, reading more as needed.
    ///
    /// On a short read the partial bytes are dropped along with the frame.
    async fn read_exact(&mut self, n: usize) -> Result<BytesMut> {
        while self.buffer.len() < n {
            match self.fill().await? {
                Fill::Data => {}
                Fill::Closed | Fill::TimedOut => {
                    let received = self.buffer.len();
                    self.buffer.clear();
                    return Err(StreamError::ShortPayload {
                        expected: n,
                        received,
                    });
                }
            }
        }
        Ok(self.buffer.split_to(n))
    }

    /// One transport read, bounded by the read timeout.
    async fn fill(&mut self) -> Result<Fill> {
        self.buffer.reserve(self.config.read_chunk_size);

        let read = self.reader.read_buf(&mut self.buffer);
        match tokio::time::timeout(self.config.read_timeout, read).await {
            Err(_) => Ok(Fill::TimedOut),
            Ok(Ok(0)) => Ok(Fill::Closed),
            Ok(Ok(_)) => Ok(Fill::Data),
            Ok(Err(e)) => Err(StreamError::Io(e)),
        }
    }

    /// Decoder counters.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Give back the transport. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
