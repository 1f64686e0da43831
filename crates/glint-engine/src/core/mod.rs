//! Core engine-facing contracts.
//!
//! The [`Scheduler`] is the main loop: applications register callbacks
//! (render, simulation, networking...) with a target frequency and hand
//! control over with [`Scheduler::go`].

mod scheduler;

pub use scheduler::{Callback, CallbackId, Scheduler, Tick};
