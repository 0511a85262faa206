//! # analog-stream
//!
//! Framed 16-bit sample streaming from a microcontroller ADC to a host.
//!
//! The device samples an analog input on a fixed microsecond tick, packs
//! samples into marker-delimited frames and writes them to a serial link.
//! The host resynchronizes on the marker, decodes frames, keeps a sliding
//! window for plotting and hands every sample to a consumer.
//!
//! ## Architecture
//!
//! - **Acquisition** (device side): tick scheduler → sampler → frame encoder
//!   → byte sink
//! - **Receiver** (host side): transport → frame reader → history window →
//!   sample consumer
//!
//! ## Wire format
//!
//! ```text
//! ┌──────────┬──────────┬────────────────────────────┐
//! │ Marker   │ Count    │ Samples                    │
//! │ 2 bytes  │ u16 LE   │ Count × i16 LE             │
//! └──────────┴──────────┴────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use analog_stream::{transport, Receiver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = transport::open_device("/dev/ttyACM0", 115_200).await?;
//!     let receiver = Receiver::builder()
//!         .sample_rate(44_100)
//!         .start(device, |samples: &[i16]| println!("{:?}", &samples[..4]))?;
//!
//!     receiver.wait().await?;
//!     Ok(())
//! }
//! ```

pub mod acquisition;
pub mod config;
pub mod consumer;
pub mod error;
pub mod history;
pub mod protocol;
pub mod reader;
pub mod receiver;
pub mod transport;

pub use config::StreamConfig;
pub use consumer::SampleConsumer;
pub use error::{Result, StreamError};
pub use history::{SampleHistory, SharedHistory};
pub use reader::FrameReader;
pub use receiver::{Receiver, ReceiverBuilder};
