//! Loopback - simulated device streaming into a host receiver.
//!
//! This example demonstrates:
//! - Running an `AcquisitionSession` over a synthetic sine input
//! - Piping the encoded frames through an in-memory transport
//! - Decoding them with a `Receiver` and a closure consumer
//!
//! ```text
//! cargo run --example loopback -- --rate 8000 --frames 20
//! ```

use std::f64::consts::TAU;
use std::io;
use std::time::Instant;

use analog_stream::acquisition::{
    AcquisitionConfig, AcquisitionSession, AnalogInput, MonotonicClock,
};
use analog_stream::protocol::{DEFAULT_MARKER, MAX_FRAME_SAMPLES};
use analog_stream::Receiver;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Stream a simulated sine wave through the full pipeline
#[derive(Parser, Debug)]
#[command(name = "loopback")]
#[command(about = "Simulated ADC streaming into a host receiver", long_about = None)]
struct Args {
    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 8_000)]
    rate: u32,

    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    tone: f64,

    /// Number of frames to stream
    #[arg(short, long, default_value_t = 20)]
    frames: u64,

    /// Samples per frame
    #[arg(long, default_value_t = MAX_FRAME_SAMPLES)]
    frame_samples: u16,
}

/// Microseconds since start, from the host's monotonic clock.
struct HostClock(Instant);

impl MonotonicClock for HostClock {
    fn now_us(&mut self) -> u32 {
        // Truncation wraps like a hardware counter.
        self.0.elapsed().as_micros() as u32
    }
}

/// Sine wave at a fixed frequency, advanced one step per read.
struct SineInput {
    phase: f64,
    step: f64,
}

impl SineInput {
    fn new(tone_hz: f64, sample_rate_hz: u32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * tone_hz / sample_rate_hz as f64,
        }
    }
}

impl AnalogInput for SineInput {
    type Error = std::convert::Infallible;

    fn read_u16(&mut self) -> Result<u16, Self::Error> {
        let value = 32_768.0 + 0.8 * 32_767.0 * self.phase.sin();
        self.phase = (self.phase + self.step) % TAU;
        Ok(value as u16)
    }
}

/// Byte sink that forwards each written frame to the async side.
struct ChannelSink(mpsc::UnboundedSender<Vec<u8>>);

impl io::Write for ChannelSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .send(buf.to_vec())
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = AcquisitionConfig {
        sample_rate_hz: args.rate,
        frame_samples: args.frame_samples,
        marker: DEFAULT_MARKER,
    };

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let (mut link_tx, link_rx) = tokio::io::duplex(64 * 1024);

    // Device side: busy-polled loop on its own thread
    let mut session = AcquisitionSession::new(
        HostClock(Instant::now()),
        SineInput::new(args.tone, args.rate),
        ChannelSink(frame_tx),
        config,
    )?;
    let frames = args.frames;
    let device = tokio::task::spawn_blocking(move || {
        session.run_frames(frames)?;
        Ok::<_, analog_stream::StreamError>(session.samples_acquired())
    });

    // Link: forward device bytes into the transport, close it when done
    let link = tokio::spawn(async move {
        while let Some(bytes) = frame_rx.recv().await {
            link_tx.write_all(&bytes).await?;
        }
        link_tx.shutdown().await
    });

    // Host side
    let mut received = 0usize;
    let receiver = Receiver::builder()
        .sample_rate(args.rate)
        .window_seconds(1.0)
        .start(link_rx, move |samples: &[i16]| {
            received += 1;
            let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
            println!("frame {:>4}: {} samples, peak {}", received, samples.len(), peak);
        })?;
    let history = receiver.history();

    let acquired = device.await??;
    link.await??;
    let (stats, _) = receiver.wait().await?;

    println!(
        "Acquired {} samples; decoded {} frames ({} samples), {} bytes discarded",
        acquired, stats.frames, stats.samples, stats.discarded_bytes
    );
    println!(
        "History holds {} samples ({:.2} s)",
        history.len(),
        history.with(|h| h.duration().as_secs_f64())
    );

    Ok(())
}
