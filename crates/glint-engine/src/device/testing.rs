//! Recording backend used by unit tests.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;

use super::backend::{
    ActiveUniform, BufferId, BufferKind, GpuBackend, Primitive, ProgramId, ShaderId, TextureId,
    UniformLocation, VertexArrayId, VertexAttribute,
};
use crate::shader::{ShaderStage, UniformValue};

/// Everything the recording backend observed.
#[derive(Debug, Default)]
pub struct Calls {
    pub buffers: Vec<(BufferKind, usize)>,
    pub deleted_buffers: Vec<BufferId>,
    pub vertex_arrays: Vec<(i32, Vec<VertexAttribute>)>,
    pub deleted_vertex_arrays: Vec<VertexArrayId>,
    pub draws: Vec<(Primitive, u32)>,
    pub textures: Vec<(TextureId, u32, u32)>,
    pub uploads: Vec<(TextureId, u32, u32, Vec<u8>)>,
    pub bound_textures: Vec<(u32, TextureId)>,
    pub deleted_textures: Vec<TextureId>,
    pub compiled: Vec<ShaderStage>,
    pub deleted_shaders: Vec<ShaderId>,
    pub linked: Vec<Vec<ShaderId>>,
    pub used_programs: Vec<ProgramId>,
    pub uniforms_set: Vec<(UniformLocation, UniformValue)>,
    pub deleted_programs: Vec<ProgramId>,
    pub clears: usize,
}

/// Knobs tests turn to provoke failures and uniform layouts.
#[derive(Debug, Default)]
pub struct Script {
    /// Stages whose source contains this marker fail to compile.
    pub compile_error_marker: Option<String>,
    pub link_error: Option<String>,
    pub fail_buffers_after: Option<usize>,
    pub uniforms: Vec<ActiveUniform>,
}

pub struct RecordingBackend {
    next: u32,
    calls: Rc<RefCell<Calls>>,
    script: Rc<RefCell<Script>>,
}

impl RecordingBackend {
    pub fn new() -> (Self, Rc<RefCell<Calls>>) {
        let (backend, calls, _) = Self::scripted();
        (backend, calls)
    }

    pub fn scripted() -> (Self, Rc<RefCell<Calls>>, Rc<RefCell<Script>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let script = Rc::new(RefCell::new(Script::default()));
        let backend = Self {
            next: 0,
            calls: Rc::clone(&calls),
            script: Rc::clone(&script),
        };
        (backend, calls, script)
    }

    fn id(&mut self) -> NonZeroU32 {
        self.next += 1;
        NonZeroU32::new(self.next).unwrap()
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, String> {
        let limit = self.script.borrow().fail_buffers_after;
        if limit.is_some_and(|n| self.calls.borrow().buffers.len() >= n) {
            return Err("out of memory".into());
        }
        self.calls.borrow_mut().buffers.push((kind, data.len()));
        Ok(BufferId(self.id()))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.borrow_mut().deleted_buffers.push(buffer);
    }

    fn create_vertex_array(
        &mut self,
        _vertices: BufferId,
        _indices: BufferId,
        stride: i32,
        attributes: &[VertexAttribute],
    ) -> Result<VertexArrayId, String> {
        self.calls
            .borrow_mut()
            .vertex_arrays
            .push((stride, attributes.to_vec()));
        Ok(VertexArrayId(self.id()))
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.calls.borrow_mut().deleted_vertex_arrays.push(vao);
    }

    fn draw_indexed(&mut self, _vao: VertexArrayId, primitive: Primitive, count: u32) {
        self.calls.borrow_mut().draws.push((primitive, count));
    }

    fn create_texture(&mut self, width: u32, height: u32, _rgba: &[u8]) -> Result<TextureId, String> {
        let id = TextureId(self.id());
        self.calls.borrow_mut().textures.push((id, width, height));
        Ok(id)
    }

    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, rgba: &[u8]) {
        self.calls
            .borrow_mut()
            .uploads
            .push((texture, width, height, rgba.to_vec()));
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) {
        self.calls.borrow_mut().bound_textures.push((slot, texture));
    }

    fn texture_slots(&self) -> u32 {
        16
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.calls.borrow_mut().deleted_textures.push(texture);
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let marker = self.script.borrow().compile_error_marker.clone();
        if marker.is_some_and(|m| source.contains(&m)) {
            return Err(format!("0:1: syntax error in {stage}"));
        }
        self.calls.borrow_mut().compiled.push(stage);
        Ok(ShaderId(self.id()))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.borrow_mut().deleted_shaders.push(shader);
    }

    fn link_program(&mut self, stages: &[ShaderId]) -> Result<ProgramId, String> {
        self.calls.borrow_mut().linked.push(stages.to_vec());
        if let Some(log) = self.script.borrow().link_error.clone() {
            return Err(log);
        }
        Ok(ProgramId(self.id()))
    }

    fn active_uniforms(&mut self, _program: ProgramId) -> Vec<ActiveUniform> {
        self.script.borrow().uniforms.clone()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.borrow_mut().used_programs.push(program);
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.calls
            .borrow_mut()
            .uniforms_set
            .push((location, value.clone()));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.borrow_mut().deleted_programs.push(program);
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.calls.borrow_mut().clears += 1;
    }

    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    fn set_depth_test(&mut self, _enabled: bool) {}
}
