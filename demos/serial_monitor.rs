//! Serial Monitor - live view of a device stream.
//!
//! This example demonstrates:
//! - Loading a `StreamConfig` from JSON, with command-line overrides
//! - Opening a serial device and starting a `Receiver` on it
//! - A consumer that prints per-frame peak level
//! - A render tick reading the shared history at its own period
//!
//! ```text
//! cargo run --example serial_monitor -- --device /dev/ttyACM0
//! cargo run --example serial_monitor -- --config stream.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use analog_stream::protocol::SampleFrame;
use analog_stream::{transport, ReceiverBuilder, StreamConfig};
use clap::Parser;

/// Monitor a framed sample stream from a serial device
#[derive(Parser, Debug)]
#[command(name = "serial_monitor")]
#[command(about = "Decode and monitor an ADC sample stream", long_about = None)]
struct Args {
    /// JSON stream configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device path (overrides the config file)
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate in Hz (overrides the config file)
    #[arg(short, long)]
    rate: Option<u32>,

    /// Render period in milliseconds
    #[arg(long, default_value_t = 500)]
    render_ms: u64,
}

/// Peak bar scaled to `width` characters.
fn level_bar(peak: u16, width: usize) -> String {
    let filled = (peak as usize * width) / 32_768;
    format!("{:<width$}", "#".repeat(filled.min(width)), width = width)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StreamConfig::from_file(path)?,
        None => StreamConfig::default(),
    };
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(rate) = args.rate {
        config.sample_rate_hz = rate;
    }
    config.validate()?;

    println!(
        "Opening {} at {} Hz (window {} s)...",
        config.device, config.sample_rate_hz, config.window_seconds
    );
    let device = transport::open_device(&config.device, config.baud_rate).await?;

    let receiver = ReceiverBuilder::from_config(&config).start(device, |samples: &[i16]| {
        let peak = SampleFrame::new(samples.to_vec()).peak();
        println!("|{}| {:>5}", level_bar(peak, 40), peak);
    })?;
    let history = receiver.history();

    // Render loop runs independently of decoding
    let mut render = tokio::time::interval(Duration::from_millis(args.render_ms));
    while !receiver.is_finished() {
        render.tick().await;
        match history.since_last_append() {
            None => println!("-- waiting for first frame"),
            Some(age) if age > config.read_timeout() => {
                println!("-- stalled: no frames for {:.1} s", age.as_secs_f64())
            }
            Some(_) => {
                let rms = history.with(|h| {
                    let points = h.timeline();
                    let sum: f64 = points.iter().map(|&(_, v)| (v as f64) * (v as f64)).sum();
                    (sum / points.len().max(1) as f64).sqrt()
                });
                println!(
                    "-- {} samples in window, {} total, rms {:.3}",
                    history.len(),
                    history.total_appended(),
                    rms
                );
            }
        }
    }

    let (stats, _) = receiver.wait().await?;
    println!(
        "Stream ended: {} frames, {} dropped, {} invalid counts, {} bytes discarded, {} timeouts",
        stats.frames,
        stats.dropped_frames,
        stats.invalid_counts,
        stats.discarded_bytes,
        stats.timeouts
    );

    Ok(())
}
