use std::num::NonZeroU32;

use crate::shader::{ShaderStage, UniformValue};

/// GPU buffer object name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub NonZeroU32);

/// Vertex array object name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexArrayId(pub NonZeroU32);

/// Texture object name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub NonZeroU32);

/// Shader stage object name. Only lives between compile and link.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub NonZeroU32);

/// Linked program object name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub NonZeroU32);

/// Uniform binding location inside a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

/// What a buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Primitive kind for indexed draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
}

/// One float vertex attribute: `components` floats at `offset` bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: i32,
}

/// Uniform as reported by the driver after link.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveUniform {
    pub name: String,
    /// Raw GL type enum (`GL_FLOAT_VEC3`, `GL_SAMPLER_2D`, ...).
    pub gl_type: u32,
    pub size: i32,
    pub location: Option<UniformLocation>,
}

/// The seam between resource types and the graphics API.
///
/// Every GL call the engine makes goes through this trait. `GlowBackend` is
/// the production implementation; tests substitute a recording double.
///
/// Creation methods return the driver's message on failure; callers wrap it
/// into [`crate::Error`].
pub trait GpuBackend {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, String>;
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Creates a vertex array binding `vertices` with `attributes` and `indices`
    /// as its element buffer.
    fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        stride: i32,
        attributes: &[VertexAttribute],
    ) -> Result<VertexArrayId, String>;
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    /// Issues one indexed draw of `count` `u32` indices.
    fn draw_indexed(&mut self, vao: VertexArrayId, primitive: Primitive, count: u32);

    /// Creates an RGBA8 texture. `rgba` rows are bottom-to-top.
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, String>;
    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, rgba: &[u8]);
    fn bind_texture(&mut self, slot: u32, texture: TextureId);
    /// Number of texture units usable by `bind_texture`.
    fn texture_slots(&self) -> u32;
    fn delete_texture(&mut self, texture: TextureId);

    /// Compiles one stage. On failure the stage object is already deleted and
    /// the compiler log is returned.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;
    fn delete_shader(&mut self, shader: ShaderId);

    /// Attaches `stages`, links, and detaches them again. On failure the
    /// program is deleted and the linker log is returned.
    fn link_program(&mut self, stages: &[ShaderId]) -> Result<ProgramId, String>;
    fn active_uniforms(&mut self, program: ProgramId) -> Vec<ActiveUniform>;
    fn use_program(&mut self, program: ProgramId);
    /// Sets a uniform on the currently used program.
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);
    fn delete_program(&mut self, program: ProgramId);

    fn clear(&mut self, color: [f32; 4]);
    fn set_viewport(&mut self, width: u32, height: u32);
    fn set_depth_test(&mut self, enabled: bool);
}
