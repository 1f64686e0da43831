//! Glint engine crate.
//!
//! A small OpenGL rendering framework: windows and input through `winit`,
//! a shared GL context through `glutin`, reference-counted GPU resources and a
//! multi-frequency callback scheduler.

pub mod assets;
pub mod core;
pub mod device;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod raster;
pub mod shader;
pub mod texture;
pub mod time;
pub mod window;

pub use assets::Assets;
pub use crate::core::{CallbackId, Scheduler, Tick};
pub use device::Gpu;
pub use error::{Error, Result};
pub use geometry::{Geometry, Vertex};
pub use mesh::Mesh;
pub use raster::{Image, Pixel};
pub use shader::{Shader, ShaderProgram, ShaderStage, UniformValue};
pub use texture::Texture;
pub use window::{Platform, WindowId, WindowParams};
