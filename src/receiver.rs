//! Host receiver: decode task, history window and consumer thread.
//!
//! The [`ReceiverBuilder`] provides a fluent API for configuring the host
//! side. The [`Receiver`] manages the lifecycle:
//! 1. Wrap the transport in a [`FrameReader`]
//! 2. Spawn the decode task (sync → decode → history → channel)
//! 3. Spawn the consumer on a blocking thread, fed in decode order
//! 4. Stop when the transport closes or fails
//!
//! ```text
//! Transport ─► FrameReader ─► SharedHistory ─► mpsc ─► SampleConsumer
//!                                   ▲
//!                     render loop ──┘ (own period)
//! ```
//!
//! Per-frame faults (timeouts, short payloads, bad counts) are logged and
//! decoding continues with a fresh marker search.
//!
//! # Example
//!
//! ```ignore
//! use analog_stream::receiver::Receiver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = analog_stream::transport::open_device("/dev/ttyACM0", 115_200).await?;
//!     let receiver = Receiver::builder()
//!         .sample_rate(44_100)
//!         .window_seconds(5.0)
//!         .start(device, |samples: &[i16]| println!("{} samples", samples.len()))?;
//!
//!     let history = receiver.history();
//!     // ... render from `history` on a timer ...
//!
//!     receiver.wait().await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::acquisition::{period_for_rate, DEFAULT_SAMPLE_RATE_HZ};
use crate::config::{StreamConfig, DEFAULT_WINDOW_SECONDS};
use crate::consumer::{DiscardConsumer, SampleConsumer};
use crate::error::{Result, StreamError};
use crate::history::{SampleHistory, SharedHistory};
use crate::protocol::{DecodeStats, Marker, SampleFrame};
use crate::reader::{FrameReader, ReaderConfig};

/// Default number of decoded frames buffered for the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Builder for configuring and starting a [`Receiver`].
pub struct ReceiverBuilder {
    marker: Marker,
    reader_config: ReaderConfig,
    sample_rate_hz: u32,
    window_seconds: f64,
    channel_capacity: usize,
}

impl ReceiverBuilder {
    /// Create a builder with defaults.
    pub fn new() -> Self {
        Self {
            marker: Marker::default(),
            reader_config: ReaderConfig::default(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Take every setting from a stream config.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            marker: config.marker,
            reader_config: ReaderConfig::from(config),
            sample_rate_hz: config.sample_rate_hz,
            window_seconds: config.window_seconds,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the frame marker.
    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    /// Set the stream sample rate (sizes the history window).
    ///
    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate_hz: u32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    /// Set the history window length.
    ///
    /// Default: 5 seconds
    pub fn window_seconds(mut self, seconds: f64) -> Self {
        self.window_seconds = seconds;
        self
    }

    /// Set the transport read timeout.
    ///
    /// Default: 1 second
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.reader_config.read_timeout = timeout;
        self
    }

    /// Set the largest accepted sample count.
    ///
    /// Default: 512
    pub fn max_frame_samples(mut self, max: u16) -> Self {
        self.reader_config.max_frame_samples = max;
        self
    }

    /// Set how many decoded frames may queue for the consumer.
    ///
    /// When full, decoding waits for the consumer.
    /// Default: 64
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    fn validate(&self) -> Result<()> {
        period_for_rate(self.sample_rate_hz)?;
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(StreamError::Config(format!(
                "window_seconds must be positive, got {}",
                self.window_seconds
            )));
        }
        if self.reader_config.read_timeout.is_zero() {
            return Err(StreamError::Config("read timeout must be non-zero".into()));
        }
        if self.channel_capacity == 0 {
            return Err(StreamError::Config("channel capacity must be non-zero".into()));
        }
        Ok(())
    }

    /// Start decoding `transport` and feeding `consumer`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<R, C>(self, transport: R, consumer: C) -> Result<Receiver<C>>
    where
        R: AsyncRead + Unpin + Send + 'static,
        C: SampleConsumer + 'static,
    {
        self.validate()?;

        let history = SharedHistory::new(SampleHistory::for_window(
            self.sample_rate_hz,
            self.window_seconds,
        ));

        let reader = FrameReader::with_config(transport, self.marker, self.reader_config);
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let decode_task = tokio::spawn(decode_loop(reader, history.clone(), tx));
        let consumer_task = tokio::task::spawn_blocking(move || consumer_loop(rx, consumer));

        Ok(Receiver {
            history,
            decode_task,
            consumer_task,
        })
    }
}

impl Default for ReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running receiver.
///
/// Use `history()` to read the sliding window from a render loop.
/// Use `wait()` to block until the transport closes.
pub struct Receiver<C = DiscardConsumer> {
    history: SharedHistory,
    decode_task: JoinHandle<Result<DecodeStats>>,
    consumer_task: JoinHandle<C>,
}

impl Receiver {
    /// Create a new receiver builder.
    pub fn builder() -> ReceiverBuilder {
        ReceiverBuilder::new()
    }
}

impl<C: SampleConsumer + 'static> Receiver<C> {
    /// Sliding window of recent samples, shared with the decode task.
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// True once the decode task has stopped.
    pub fn is_finished(&self) -> bool {
        self.decode_task.is_finished()
    }

    /// Stop decoding now. The consumer still receives queued frames.
    pub fn abort(&self) {
        self.decode_task.abort();
    }

    /// Wait for the stream to end.
    ///
    /// Returns the decoder counters and the consumer, after every decoded
    /// frame has been delivered to it.
    pub async fn wait(self) -> Result<(DecodeStats, C)> {
        let decoded = match self.decode_task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(DecodeStats::default()),
            Err(e) => Err(StreamError::Io(std::io::Error::other(e))),
        };

        let consumer = self
            .consumer_task
            .await
            .map_err(|e| StreamError::Io(std::io::Error::other(e)))?;

        Ok((decoded?, consumer))
    }
}

/// Main decode loop - reads frames, records them, forwards them.
async fn decode_loop<R: AsyncRead + Unpin>(
    mut reader: FrameReader<R>,
    history: SharedHistory,
    tx: mpsc::Sender<SampleFrame>,
) -> Result<DecodeStats> {
    loop {
        match reader.read_frame().await {
            Ok(frame) => {
                history.append(frame.samples());
                if tx.send(frame).await.is_err() {
                    tracing::debug!("Consumer gone, stopping decode loop");
                    return Ok(reader.stats());
                }
            }
            Err(StreamError::TransportTimeout) => {
                tracing::debug!("No data within {:?}", reader.config().read_timeout);
            }
            Err(e) if e.is_frame_fault() => {
                tracing::warn!("Dropped frame: {}", e);
            }
            Err(StreamError::TransportClosed) => {
                tracing::debug!("Transport closed after {} frames", reader.stats().frames);
                return Ok(reader.stats());
            }
            Err(e) => {
                tracing::error!("Decode loop error: {}", e);
                return Err(e);
            }
        }
    }
}

/// Consumer thread - delivers frames in decode order.
fn consumer_loop<C: SampleConsumer>(mut rx: mpsc::Receiver<SampleFrame>, mut consumer: C) -> C {
    while let Some(frame) = rx.blocking_recv() {
        consumer.accept(frame.samples());
    }
    consumer.finish();
    consumer
}
