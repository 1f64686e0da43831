use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::backend::{BufferId, GpuBackend, ProgramId, TextureId, VertexArrayId};
use crate::device::Handle;
use crate::error::{Error, Result};
use crate::mesh::Batch;

new_key_type! {
    /// Stable id of one shared GPU resource inside the [`Gpu`] arena.
    pub struct ResourceKey;
}

/// GPU objects making up one shareable resource.
#[derive(Debug)]
pub(crate) enum Resource {
    Mesh {
        vertices: BufferId,
        batches: Vec<Batch>,
    },
    Texture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    Program {
        program: ProgramId,
    },
}

#[derive(Debug)]
struct Slot {
    refs: u32,
    resource: Resource,
}

/// Owns the graphics backend and the arena of live shared resources.
///
/// Every resource handle holds an `Rc<Gpu>` plus a [`ResourceKey`]; the arena
/// stores the reference count next to the GPU object names. When the count
/// reaches zero the slot is removed and its objects are deleted, exactly once.
///
/// `Gpu` is single-threaded by construction (`Rc` + `RefCell`).
pub struct Gpu {
    backend: RefCell<Box<dyn GpuBackend>>,
    resources: RefCell<SlotMap<ResourceKey, Slot>>,

    /// Set once the owning GL context is gone; releases then skip GL calls.
    lost: Cell<bool>,
}

impl Gpu {
    /// Wraps a backend into a shareable GPU context.
    pub fn new(backend: impl GpuBackend + 'static) -> Rc<Self> {
        Rc::new(Self {
            backend: RefCell::new(Box::new(backend)),
            resources: RefCell::new(SlotMap::with_key()),
            lost: Cell::new(false),
        })
    }

    /// Number of live resources (meshes, textures, programs).
    pub fn live_resources(&self) -> usize {
        self.resources.borrow().len()
    }

    /// Whether the GL context backing this GPU has been torn down.
    pub fn is_lost(&self) -> bool {
        self.lost.get()
    }

    /// Fails once the context is lost; resource constructors call this before
    /// creating any GPU object.
    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.lost.get() {
            return Err(Error::Context("GPU context lost".into()));
        }
        Ok(())
    }

    /// Marks the context as gone. Handles still alive afterwards release their
    /// arena slots without touching the driver.
    pub(crate) fn invalidate(&self) {
        if !self.lost.replace(true) {
            log::debug!(
                "GPU context invalidated with {} live resource(s)",
                self.live_resources()
            );
        }
    }

    /// Clears color and depth of the current framebuffer.
    pub fn clear(&self, color: [f32; 4]) {
        self.with_live_backend(|b| b.clear(color));
    }

    /// Sets the viewport to `(0, 0, width, height)`.
    pub fn set_viewport(&self, width: u32, height: u32) {
        self.with_live_backend(|b| b.set_viewport(width, height));
    }

    pub fn set_depth_test(&self, enabled: bool) {
        self.with_live_backend(|b| b.set_depth_test(enabled));
    }

    pub(crate) fn with_backend<R>(&self, f: impl FnOnce(&mut dyn GpuBackend) -> R) -> R {
        let mut backend = self.backend.borrow_mut();
        f(backend.as_mut())
    }

    /// Like `with_backend` for state and draw calls, which are dropped once the
    /// context is lost.
    pub(crate) fn with_live_backend(&self, f: impl FnOnce(&mut dyn GpuBackend)) {
        if !self.lost.get() {
            self.with_backend(f);
        }
    }

    /// Registers a fully created resource and returns its first owner.
    pub(crate) fn insert(self: &Rc<Self>, resource: Resource) -> Handle {
        log::trace!("gpu: insert {resource:?}");
        let key = self
            .resources
            .borrow_mut()
            .insert(Slot { refs: 1, resource });
        Handle::from_parts(Rc::clone(self), key)
    }

    pub(crate) fn with_resource<R>(&self, key: ResourceKey, f: impl FnOnce(&Resource) -> R) -> Option<R> {
        self.resources.borrow().get(key).map(|slot| f(&slot.resource))
    }

    pub(crate) fn with_resource_mut<R>(
        &self,
        key: ResourceKey,
        f: impl FnOnce(&mut Resource) -> R,
    ) -> Option<R> {
        self.resources
            .borrow_mut()
            .get_mut(key)
            .map(|slot| f(&mut slot.resource))
    }

    pub(crate) fn ref_count(&self, key: ResourceKey) -> u32 {
        self.resources.borrow().get(key).map_or(0, |slot| slot.refs)
    }

    pub(crate) fn retain(&self, key: ResourceKey) {
        if let Some(slot) = self.resources.borrow_mut().get_mut(key) {
            slot.refs += 1;
        }
    }

    pub(crate) fn release(&self, key: ResourceKey) {
        let resource = {
            let mut resources = self.resources.borrow_mut();
            let Some(slot) = resources.get_mut(key) else {
                return;
            };
            slot.refs -= 1;
            if slot.refs > 0 {
                return;
            }
            match resources.remove(key) {
                Some(slot) => slot.resource,
                None => return,
            }
        };

        self.destroy(resource);
    }

    /// Deletes the GPU objects of a resource that no handle refers to.
    pub(crate) fn destroy(&self, resource: Resource) {
        log::trace!("gpu: release {resource:?}");
        if self.lost.get() {
            return;
        }

        self.with_backend(|b| match resource {
            Resource::Mesh { vertices, batches } => {
                for batch in batches {
                    delete_batch(b, batch.vao, batch.indices);
                }
                b.delete_buffer(vertices);
            }
            Resource::Texture { texture, .. } => b.delete_texture(texture),
            Resource::Program { program } => b.delete_program(program),
        });
    }
}

fn delete_batch(b: &mut dyn GpuBackend, vao: VertexArrayId, indices: BufferId) {
    b.delete_vertex_array(vao);
    b.delete_buffer(indices);
}

impl std::fmt::Debug for Gpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpu")
            .field("live_resources", &self.live_resources())
            .field("lost", &self.lost.get())
            .finish()
    }
}
