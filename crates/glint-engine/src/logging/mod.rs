//! Logging utilities.
//!
//! The engine only speaks the `log` facade; applications call
//! [`init_logging`] once to install `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig};
