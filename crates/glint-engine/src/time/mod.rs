//! Time subsystem.
//!
//! Clocks are injected wherever time matters, so scheduling and frame timing
//! can be driven from tests with a [`ManualClock`].

mod clock;
mod frame_clock;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frame_clock::{FrameClock, FrameTime, FPS_WINDOW};
