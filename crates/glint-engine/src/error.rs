//! Engine error type.

use thiserror::Error;

use crate::shader::{ShaderStage, UniformType};

/// Result alias used by every fallible engine API.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // ── resource creation ─────────────────────────────────────────────────
    #[error("failed to create window: {0}")]
    Window(String),

    #[error("failed to set up the GL context: {0}")]
    Context(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The driver refused to create a GPU object.
    #[error("failed to create GPU {kind}: {message}")]
    ObjectCreation { kind: &'static str, message: String },

    /// Carries the offending source so the diagnostic is self-contained.
    #[error("{stage} shader failed to compile:\n{log}\n---- source ----\n{code}")]
    ShaderCompile {
        stage: ShaderStage,
        code: String,
        log: String,
    },

    #[error("shader program failed to link:\n{log}")]
    ShaderLink { log: String },

    // ── invalid arguments ─────────────────────────────────────────────────
    #[error("texture slot {slot} out of range (0..{max})")]
    TextureSlotOutOfRange { slot: u32, max: u32 },

    #[error("pixel ({x}, {y}) out of range for {width}x{height} image")]
    PixelOutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("uniform `{name}` is declared {declared:?}, cannot set it from a {given} value")]
    UniformTypeMismatch {
        name: String,
        declared: UniformType,
        given: &'static str,
    },

    #[error("no open window with id {0:?}")]
    UnknownWindow(winit::window::WindowId),

    // ── external ──────────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn creation(kind: &'static str, message: impl Into<String>) -> Self {
        Self::ObjectCreation {
            kind,
            message: message.into(),
        }
    }
}
