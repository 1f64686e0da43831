use glow::{HasContext, PixelUnpackData};

use super::backend::{
    ActiveUniform, BufferId, BufferKind, GpuBackend, Primitive, ProgramId, ShaderId, TextureId,
    UniformLocation, VertexArrayId, VertexAttribute,
};
use crate::shader::{ShaderStage, UniformValue};

/// Production backend on top of a loaded `glow` context.
///
/// The GL context must be current on the calling thread for every call.
pub struct GlowBackend {
    gl: glow::Context,
    texture_slots: u32,
}

impl GlowBackend {
    pub fn new(gl: glow::Context) -> Self {
        let texture_slots = unsafe { gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) };
        log_driver_info(&gl);

        Self {
            gl,
            texture_slots: texture_slots.max(1) as u32,
        }
    }
}

fn log_driver_info(gl: &glow::Context) {
    unsafe {
        let vendor = gl.get_parameter_string(glow::VENDOR);
        let renderer = gl.get_parameter_string(glow::RENDERER);
        let version = gl.get_parameter_string(glow::VERSION);
        let glsl = gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION);
        log::info!("OpenGL driver: {renderer} [{vendor}], {version}, GLSL {glsl}");
    }
}

fn buffer(id: BufferId) -> glow::Buffer {
    glow::NativeBuffer(id.0)
}

fn vertex_array(id: VertexArrayId) -> glow::VertexArray {
    glow::NativeVertexArray(id.0)
}

fn texture(id: TextureId) -> glow::Texture {
    glow::NativeTexture(id.0)
}

fn shader(id: ShaderId) -> glow::Shader {
    glow::NativeShader(id.0)
}

fn program(id: ProgramId) -> glow::Program {
    glow::NativeProgram(id.0)
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn primitive_enum(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::Triangles => glow::TRIANGLES,
    }
}

impl GpuBackend for GlowBackend {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, String> {
        let target = match kind {
            BufferKind::Vertex => glow::ARRAY_BUFFER,
            BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        };
        unsafe {
            let buf = self.gl.create_buffer()?;
            self.gl.bind_buffer(target, Some(buf));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
            Ok(BufferId(buf.0))
        }
    }

    fn delete_buffer(&mut self, id: BufferId) {
        unsafe { self.gl.delete_buffer(buffer(id)) }
    }

    fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        stride: i32,
        attributes: &[VertexAttribute],
    ) -> Result<VertexArrayId, String> {
        unsafe {
            let vao = self.gl.create_vertex_array()?;
            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer(vertices)));
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer(indices)));

            for attr in attributes {
                self.gl.enable_vertex_attrib_array(attr.location);
                self.gl.vertex_attrib_pointer_f32(
                    attr.location,
                    attr.components,
                    glow::FLOAT,
                    false,
                    stride,
                    attr.offset,
                );
            }

            // Element buffer binding is VAO state; unbind the VAO first.
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            Ok(VertexArrayId(vao.0))
        }
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        unsafe { self.gl.delete_vertex_array(vertex_array(vao)) }
    }

    fn draw_indexed(&mut self, vao: VertexArrayId, primitive: Primitive, count: u32) {
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array(vao)));
            self.gl
                .draw_elements(primitive_enum(primitive), count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, String> {
        unsafe {
            let t = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(t));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );

            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(rgba)),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureId(t.0))
        }
    }

    fn upload_texture(&mut self, id: TextureId, width: u32, height: u32, rgba: &[u8]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(rgba)),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture(&mut self, slot: u32, id: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + slot);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
        }
    }

    fn texture_slots(&self) -> u32 {
        self.texture_slots
    }

    fn delete_texture(&mut self, id: TextureId) {
        unsafe { self.gl.delete_texture(texture(id)) }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        unsafe {
            let sh = self.gl.create_shader(stage_enum(stage))?;
            self.gl.shader_source(sh, source);
            self.gl.compile_shader(sh);
            if !self.gl.get_shader_compile_status(sh) {
                let log = self.gl.get_shader_info_log(sh);
                self.gl.delete_shader(sh);
                return Err(log);
            }
            Ok(ShaderId(sh.0))
        }
    }

    fn delete_shader(&mut self, id: ShaderId) {
        unsafe { self.gl.delete_shader(shader(id)) }
    }

    fn link_program(&mut self, stages: &[ShaderId]) -> Result<ProgramId, String> {
        unsafe {
            let p = self.gl.create_program()?;
            for &s in stages {
                self.gl.attach_shader(p, shader(s));
            }
            self.gl.link_program(p);
            for &s in stages {
                self.gl.detach_shader(p, shader(s));
            }

            if !self.gl.get_program_link_status(p) {
                let log = self.gl.get_program_info_log(p);
                self.gl.delete_program(p);
                return Err(log);
            }
            Ok(ProgramId(p.0))
        }
    }

    fn active_uniforms(&mut self, id: ProgramId) -> Vec<ActiveUniform> {
        let p = program(id);
        unsafe {
            let count = self.gl.get_active_uniforms(p);
            (0..count)
                .filter_map(|index| self.gl.get_active_uniform(p, index))
                .map(|u| {
                    let location = self
                        .gl
                        .get_uniform_location(p, &u.name)
                        .map(|loc| UniformLocation(loc.0));
                    ActiveUniform {
                        name: u.name,
                        gl_type: u.utype,
                        size: u.size,
                        location,
                    }
                })
                .collect()
        }
    }

    fn use_program(&mut self, id: ProgramId) {
        unsafe { self.gl.use_program(Some(program(id))) }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let loc = glow::NativeUniformLocation(location.0);
        let loc = Some(&loc);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, *v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32_slice(loc, v),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32_slice(loc, v),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32_slice(loc, v),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(loc, false, m),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(loc, false, m),
            }
        }
    }

    fn delete_program(&mut self, id: ProgramId) {
        unsafe { self.gl.delete_program(program(id)) }
    }

    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }
}
