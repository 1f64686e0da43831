//! GPU device management.
//!
//! This module is responsible for:
//! - the `GpuBackend` seam every GL call goes through
//! - creating the shared GL context and per-window surfaces
//! - the resource arena behind reference-counted [`Handle`]s

mod backend;
mod context;
mod gl;
mod gpu;
mod handle;
mod init;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    ActiveUniform, BufferId, BufferKind, GpuBackend, Primitive, ProgramId, ShaderId, TextureId,
    UniformLocation, VertexArrayId, VertexAttribute,
};
pub use gl::GlowBackend;
pub use gpu::{Gpu, ResourceKey};
pub use handle::Handle;
pub use init::ContextParams;

pub(crate) use context::GlContext;
pub(crate) use gpu::Resource;
