//! Windows and the platform event loop.
//!
//! [`Platform`] owns the `winit` event loop, every window with its GL surface,
//! and the GPU context they share.

mod params;
mod platform;

pub use params::WindowParams;
pub use platform::Platform;
pub use winit::window::WindowId;
