//! Shader sources, linked programs and typed uniform handles.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::device::{GpuBackend, Gpu, Handle, ProgramId, Resource, ShaderId, UniformLocation};
use crate::error::{Error, Result};

/// `name` with the stage extension appended, so `lit.v2` reads `lit.v2.vert`.
fn stage_path(name: &Path, stage: ShaderStage) -> PathBuf {
    let mut path = name.as_os_str().to_owned();
    path.push(".");
    path.push(stage.extension());
    PathBuf::from(path)
}

// ── stages & sources ──────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
}

impl ShaderStage {
    /// Pipeline order; also the order stages are compiled in.
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
    ];

    /// File extension used by [`ShaderProgram::from_files`].
    pub const fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::TessControl => "tcs",
            ShaderStage::TessEvaluation => "tes",
            ShaderStage::Geometry => "geo",
            ShaderStage::Fragment => "frag",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

/// GLSL sources for up to five stages. Empty stages are skipped at link time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderProgram {
    sources: [String; 5],
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: ShaderStage, source: impl Into<String>) -> Self {
        self.set_stage(stage, source);
        self
    }

    pub fn set_stage(&mut self, stage: ShaderStage, source: impl Into<String>) {
        self.sources[stage.index()] = source.into();
    }

    pub fn source(&self, stage: ShaderStage) -> &str {
        &self.sources[stage.index()]
    }

    /// Reads `name.vert`, `name.tcs`, `name.tes`, `name.geo` and `name.frag`.
    ///
    /// A missing file leaves that stage empty; any other I/O error fails.
    pub fn from_files(name: impl AsRef<Path>) -> Result<Self> {
        let name = name.as_ref();
        let mut program = Self::new();

        for stage in ShaderStage::ALL {
            let path = stage_path(name, stage);
            match std::fs::read_to_string(&path) {
                Ok(src) => program.set_stage(stage, src),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::trace!("no {stage} stage at {}", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(program)
    }

    fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        ShaderStage::ALL
            .into_iter()
            .map(|s| (s, self.source(s)))
            .filter(|(_, src)| !src.trim().is_empty())
    }
}

// ── uniform types ─────────────────────────────────────────────────────────

/// Declared type of an active uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Int,
    Bool,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    /// Any sampler; set with an `Int` texture slot.
    Sampler,
    /// A type no [`UniformValue`] can set.
    Other(u32),
}

impl UniformType {
    pub fn from_gl(gl_type: u32) -> Self {
        match gl_type {
            glow::INT => UniformType::Int,
            glow::BOOL => UniformType::Bool,
            glow::FLOAT => UniformType::Float,
            glow::FLOAT_VEC2 => UniformType::Vec2,
            glow::FLOAT_VEC3 => UniformType::Vec3,
            glow::FLOAT_VEC4 => UniformType::Vec4,
            glow::FLOAT_MAT3 => UniformType::Mat3,
            glow::FLOAT_MAT4 => UniformType::Mat4,
            glow::SAMPLER_1D
            | glow::SAMPLER_2D
            | glow::SAMPLER_3D
            | glow::SAMPLER_CUBE
            | glow::SAMPLER_2D_ARRAY
            | glow::SAMPLER_2D_SHADOW => UniformType::Sampler,
            other => UniformType::Other(other),
        }
    }

    /// Whether a value of `value`'s class may be written to this uniform.
    fn accepts(self, value: &UniformValue) -> bool {
        matches!(
            (self, value),
            (
                UniformType::Int | UniformType::Bool | UniformType::Sampler,
                UniformValue::Int(_)
            ) | (UniformType::Float, UniformValue::Float(_))
                | (UniformType::Vec2, UniformValue::Vec2(_))
                | (UniformType::Vec3, UniformValue::Vec3(_))
                | (UniformType::Vec4, UniformValue::Vec4(_))
                | (UniformType::Mat3, UniformValue::Mat3(_))
                | (UniformType::Mat4, UniformValue::Mat4(_))
        )
    }
}

/// A value to write into a uniform. Matrices are column-major.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn class_name(&self) -> &'static str {
        match self {
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Int(i32::from(v))
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<glam::Vec2> for UniformValue {
    fn from(v: glam::Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

impl From<glam::Vec3> for UniformValue {
    fn from(v: glam::Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<glam::Vec4> for UniformValue {
    fn from(v: glam::Vec4) -> Self {
        UniformValue::Vec4(v.to_array())
    }
}

impl From<glam::Mat3> for UniformValue {
    fn from(m: glam::Mat3) -> Self {
        UniformValue::Mat3(m.to_cols_array())
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

/// What the driver reported for one active uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UniformSlot {
    pub ty: UniformType,
    /// Declared array length (`1` for non-arrays).
    pub size: i32,
    pub location: UniformLocation,
}

// ── linked shader ─────────────────────────────────────────────────────────

/// Linked GPU program plus its active-uniform table.
///
/// The table is built once after linking and shared by clones.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    handle: Handle,
    uniforms: Rc<HashMap<String, UniformSlot>>,
}

impl Shader {
    /// Compiles every non-empty stage and links them.
    ///
    /// Compile errors carry the stage source and compiler log, link errors the
    /// linker log. Stage objects never outlive this call.
    pub fn new(gpu: &Rc<Gpu>, program: &ShaderProgram) -> Result<Self> {
        gpu.ensure_live()?;
        let (program_id, uniforms) = gpu.with_backend(|b| build(b, program))?;
        log::debug!("linked shader program with {} active uniform(s)", uniforms.len());

        Ok(Self {
            handle: gpu.insert(Resource::Program {
                program: program_id,
            }),
            uniforms: Rc::new(uniforms),
        })
    }

    /// Reads the stage files for `name` and builds the program.
    pub fn from_files(gpu: &Rc<Gpu>, name: impl AsRef<Path>) -> Result<Self> {
        Self::new(gpu, &ShaderProgram::from_files(name)?)
    }

    /// Makes this program current for subsequent draws.
    pub fn bind(&self) {
        if let Some(program) = self.program() {
            self.handle.gpu().with_live_backend(|b| b.use_program(program));
        }
    }

    /// Looks up a uniform. Unknown names yield a handle whose `set` is a no-op.
    pub fn uniform(&self, name: &str) -> Uniform<'_> {
        Uniform {
            shader: self,
            name: name.to_string(),
            slot: self.uniforms.get(name).copied(),
        }
    }

    /// Shorthand for `self.uniform(name).set(value)`.
    pub fn set(&self, name: &str, value: impl Into<UniformValue>) -> Result<bool> {
        self.uniform(name).set(value)
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn program(&self) -> Option<ProgramId> {
        self.handle
            .gpu()
            .with_resource(self.handle.key(), |r| match r {
                Resource::Program { program } => Some(*program),
                _ => None,
            })
            .flatten()
    }
}

/// A named uniform of one [`Shader`].
#[derive(Debug, Clone)]
pub struct Uniform<'a> {
    shader: &'a Shader,
    name: String,
    slot: Option<UniformSlot>,
}

impl Uniform<'_> {
    /// Whether the linked program has this uniform.
    pub fn exists(&self) -> bool {
        self.slot.is_some()
    }

    pub fn slot(&self) -> Option<UniformSlot> {
        self.slot
    }

    /// Writes `value`, binding the program first.
    ///
    /// Returns `Ok(false)` without touching the GPU when the uniform does not
    /// exist, and an error when the value's class differs from the declared type.
    pub fn set(&self, value: impl Into<UniformValue>) -> Result<bool> {
        let Some(slot) = self.slot else {
            return Ok(false);
        };

        let value = value.into();
        if !slot.ty.accepts(&value) {
            return Err(Error::UniformTypeMismatch {
                name: self.name.clone(),
                declared: slot.ty,
                given: value.class_name(),
            });
        }

        let Some(program) = self.shader.program() else {
            return Ok(false);
        };
        self.shader.handle.gpu().with_live_backend(|b| {
            b.use_program(program);
            b.set_uniform(slot.location, &value);
        });
        Ok(true)
    }
}

fn build(
    b: &mut dyn GpuBackend,
    program: &ShaderProgram,
) -> Result<(ProgramId, HashMap<String, UniformSlot>)> {
    let mut compiled: Vec<ShaderId> = Vec::new();

    for (stage, source) in program.stages() {
        match b.compile_shader(stage, source) {
            Ok(id) => compiled.push(id),
            Err(log) => {
                for id in compiled {
                    b.delete_shader(id);
                }
                return Err(Error::ShaderCompile {
                    stage,
                    code: source.to_string(),
                    log,
                });
            }
        }
    }

    let linked = b.link_program(&compiled);
    for id in compiled {
        b.delete_shader(id);
    }
    let program_id = linked.map_err(|log| Error::ShaderLink { log })?;

    let uniforms = b
        .active_uniforms(program_id)
        .into_iter()
        .filter_map(|u| {
            let location = u.location?;
            let name = u.name.strip_suffix("[0]").unwrap_or(&u.name).to_string();
            Some((
                name,
                UniformSlot {
                    ty: UniformType::from_gl(u.gl_type),
                    size: u.size,
                    location,
                },
            ))
        })
        .collect();

    Ok((program_id, uniforms))
}
