//! Device side: periodic sampling and frame encoding.
//!
//! Everything here is synchronous and allocation-free after construction,
//! so it runs on a cooperative single-task loop:
//!
//! ```text
//! MonotonicClock ─► TickScheduler ─► Sampler ─► FrameEncoder ─► io::Write
//! ```
//!
//! Hardware is reached through two small traits, [`MonotonicClock`] and
//! [`AnalogInput`], which board support code implements.
//!
//! # Example
//!
//! ```
//! use analog_stream::acquisition::{
//!     AcquisitionConfig, AcquisitionSession, AnalogInput, MonotonicClock,
//! };
//!
//! struct Counter(u32);
//! impl MonotonicClock for Counter {
//!     fn now_us(&mut self) -> u32 {
//!         self.0 = self.0.wrapping_add(25);
//!         self.0
//!     }
//! }
//!
//! struct Midscale;
//! impl AnalogInput for Midscale {
//!     type Error = std::convert::Infallible;
//!     fn read_u16(&mut self) -> Result<u16, Self::Error> {
//!         Ok(32_768)
//!     }
//! }
//!
//! let mut session =
//!     AcquisitionSession::new(Counter(0), Midscale, Vec::new(), AcquisitionConfig::default())
//!         .unwrap();
//! session.run_frames(1).unwrap();
//! assert_eq!(session.sink().len(), 4 + 512 * 2);
//! ```

mod encoder;
mod sampler;
mod session;
mod tick;

pub use encoder::FrameEncoder;
pub use sampler::{to_sample, AnalogInput, Sampler, ADC_MIDPOINT};
pub use session::{AcquisitionConfig, AcquisitionSession, DEFAULT_SAMPLE_RATE_HZ};
pub use tick::{
    period_for_rate, ticks_add, ticks_diff, MonotonicClock, TickScheduler, MICROS_PER_SECOND,
};
