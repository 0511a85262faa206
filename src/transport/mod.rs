//! Transport module - byte stream sources for the host.
//!
//! The decoder works over any ordered byte stream (`tokio::io::AsyncRead`).
//! This module provides the serial device source; tests and demos use
//! in-memory pipes such as `tokio::io::duplex`.

mod serial;

pub use serial::{open_device, SerialDevice};
