//! Serial port source.
//!
//! The port is opened raw at 8N1 with no flow control and the configured baud
//! rate. Raw mode matters even for USB CDC-ACM devices (`/dev/ttyACM*`): the
//! tty line discipline still sits between the driver and the reader, and in
//! its default canonical mode it rewrites sample bytes (`0x0D` → `0x0A`),
//! swallows `0x04` as end-of-file and holds reads back until a newline.
//!
//! # Example
//!
//! ```ignore
//! use analog_stream::transport::open_device;
//!
//! let device = open_device("/dev/ttyACM0", 115_200).await?;
//! ```

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::error::Result;

/// An open serial port, readable as a byte stream.
pub struct SerialDevice {
    port: SerialStream,
    path: PathBuf,
    baud_rate: u32,
}

impl SerialDevice {
    /// Open `path` raw at `baud_rate`, 8N1.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let port = tokio_serial::new(path.to_string_lossy(), baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;

        tracing::debug!("Opened {} raw at {} baud", path.display(), baud_rate);

        Ok(Self {
            port,
            path,
            baud_rate,
        })
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Get a mutable reference to the underlying port.
    pub fn inner_mut(&mut self) -> &mut SerialStream {
        &mut self.port
    }
}

impl AsyncRead for SerialDevice {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.port).poll_read(cx, buf)
    }
}

/// Open a serial port for reading.
pub async fn open_device(path: impl AsRef<Path>, baud_rate: u32) -> Result<SerialDevice> {
    SerialDevice::open(path, baud_rate).await
}
