//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The platform layer translates winit events into `InputEvent`s and folds
//! them into one `InputState` per window.

mod state;
mod translate;
mod types;

pub use state::{ButtonRecord, InputState};
pub use types::{Button, ButtonState, InputEvent, Key, Modifiers, MouseButton};

pub(crate) use translate::translate_window_event;
