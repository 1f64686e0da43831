//! GPU meshes.

use std::mem::{offset_of, size_of};
use std::rc::Rc;

use crate::device::{
    BufferId, BufferKind, GpuBackend, Gpu, Handle, Primitive, Resource, VertexArrayId,
    VertexAttribute,
};
use crate::error::{Error, Result};
use crate::geometry::{Geometry, Vertex};

/// Attribute layout shared by every mesh: position, normal, texcoord.
const ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: offset_of!(Vertex, position) as i32,
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset: offset_of!(Vertex, normal) as i32,
    },
    VertexAttribute {
        location: 2,
        components: 2,
        offset: offset_of!(Vertex, tex_coord) as i32,
    },
];

/// Draw order within [`Mesh::draw`].
const DRAW_ORDER: [Primitive; 3] = [Primitive::Triangles, Primitive::Lines, Primitive::Points];

/// One primitive kind's index buffer and vertex array.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Batch {
    pub primitive: Primitive,
    pub indices: BufferId,
    pub vao: VertexArrayId,
    pub count: u32,
}

/// Immutable GPU mesh: one vertex buffer plus up to three indexed batches.
///
/// Clones share the GPU objects; they are deleted when the last clone drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    handle: Handle,
}

impl Mesh {
    /// Uploads `geometry`. Primitive kinds without indices get no batch.
    pub fn new(gpu: &Rc<Gpu>, geometry: &Geometry) -> Result<Self> {
        gpu.ensure_live()?;
        let resource = gpu.with_backend(|b| upload(b, geometry))?;
        Ok(Self {
            handle: gpu.insert(resource),
        })
    }

    /// Draws triangles, then lines, then points with the currently bound
    /// shader and textures. Empty kinds issue no draw call.
    pub fn draw(&self) {
        let gpu = self.handle.gpu();
        let batches = gpu
            .with_resource(self.handle.key(), |r| match r {
                Resource::Mesh { batches, .. } => batches.clone(),
                _ => Vec::new(),
            })
            .unwrap_or_default();

        gpu.with_live_backend(|b| {
            for batch in &batches {
                b.draw_indexed(batch.vao, batch.primitive, batch.count);
            }
        });
    }

    /// Number of indices uploaded for `primitive`.
    pub fn index_count(&self, primitive: Primitive) -> u32 {
        self.handle
            .gpu()
            .with_resource(self.handle.key(), |r| match r {
                Resource::Mesh { batches, .. } => batches
                    .iter()
                    .find(|b| b.primitive == primitive)
                    .map_or(0, |b| b.count),
                _ => 0,
            })
            .unwrap_or(0)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

fn indices_of(geometry: &Geometry, primitive: Primitive) -> &[u32] {
    match primitive {
        Primitive::Points => geometry.points(),
        Primitive::Lines => geometry.lines(),
        Primitive::Triangles => geometry.triangles(),
    }
}

fn upload(b: &mut dyn GpuBackend, geometry: &Geometry) -> Result<Resource> {
    let vertices = b
        .create_buffer(BufferKind::Vertex, bytemuck::cast_slice(geometry.vertices()))
        .map_err(|e| Error::creation("vertex buffer", e))?;

    let mut batches = Vec::with_capacity(DRAW_ORDER.len());
    for primitive in DRAW_ORDER {
        let indices = indices_of(geometry, primitive);
        if indices.is_empty() {
            continue;
        }

        match upload_batch(b, vertices, primitive, indices) {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                // Unwind everything created so far; no slot exists yet.
                for batch in batches {
                    b.delete_vertex_array(batch.vao);
                    b.delete_buffer(batch.indices);
                }
                b.delete_buffer(vertices);
                return Err(e);
            }
        }
    }

    Ok(Resource::Mesh { vertices, batches })
}

fn upload_batch(
    b: &mut dyn GpuBackend,
    vertices: BufferId,
    primitive: Primitive,
    indices: &[u32],
) -> Result<Batch> {
    let index_buffer = b
        .create_buffer(BufferKind::Index, bytemuck::cast_slice(indices))
        .map_err(|e| Error::creation("index buffer", e))?;

    let vao = match b.create_vertex_array(
        vertices,
        index_buffer,
        size_of::<Vertex>() as i32,
        &ATTRIBUTES,
    ) {
        Ok(vao) => vao,
        Err(e) => {
            b.delete_buffer(index_buffer);
            return Err(Error::creation("vertex array", e));
        }
    };

    Ok(Batch {
        primitive,
        indices: index_buffer,
        vao,
        count: indices.len() as u32,
    })
}
