use std::rc::Rc;

use super::gpu::{Gpu, ResourceKey};

/// Shared owner of one arena resource.
///
/// Cloning bumps the reference count stored in the arena; dropping the last
/// clone deletes the underlying GPU objects. There is no way to swap the GPU
/// objects behind a live handle.
pub struct Handle {
    gpu: Rc<Gpu>,
    key: ResourceKey,
}

impl Handle {
    pub(crate) fn from_parts(gpu: Rc<Gpu>, key: ResourceKey) -> Self {
        Self { gpu, key }
    }

    pub fn gpu(&self) -> &Rc<Gpu> {
        &self.gpu
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// Number of live handles sharing this resource.
    pub fn ref_count(&self) -> u32 {
        self.gpu.ref_count(self.key)
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        self.gpu.retain(self.key);
        Self {
            gpu: Rc::clone(&self.gpu),
            key: self.key,
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.gpu.release(self.key);
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.gpu, &other.gpu) && self.key == other.key
    }
}

impl Eq for Handle {}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.key)
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::RecordingBackend;
    use crate::device::Resource;
    use crate::device::backend::{GpuBackend, TextureId};

    fn texture_handle(gpu: &Rc<Gpu>) -> (Handle, TextureId) {
        let id = gpu
            .with_backend(|b| b.create_texture(1, 1, &[0; 4]))
            .unwrap();
        let handle = gpu.insert(Resource::Texture {
            texture: id,
            width: 1,
            height: 1,
        });
        (handle, id)
    }

    // ── reference counting ────────────────────────────────────────────────

    #[test]
    fn clone_shares_the_same_slot() {
        let (backend, _calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let (a, _) = texture_handle(&gpu);
        let b = a.clone();

        assert_eq!(a, b);
        assert_eq!(a.ref_count(), 2);
        assert_eq!(gpu.live_resources(), 1);
    }

    #[test]
    fn release_happens_once_after_last_clone() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let (a, id) = texture_handle(&gpu);
        let b = a.clone();
        let c = b.clone();

        drop(a);
        drop(c);
        assert!(calls.borrow().deleted_textures.is_empty());
        assert_eq!(b.ref_count(), 1);

        drop(b);
        assert_eq!(calls.borrow().deleted_textures, vec![id]);
        assert_eq!(gpu.live_resources(), 0);
    }

    #[test]
    fn lost_context_skips_driver_calls() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let (a, _) = texture_handle(&gpu);

        gpu.invalidate();
        drop(a);

        assert!(calls.borrow().deleted_textures.is_empty());
        assert_eq!(gpu.live_resources(), 0);
    }

    #[test]
    fn independent_resources_have_independent_counts() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let (a, id_a) = texture_handle(&gpu);
        let (b, _) = texture_handle(&gpu);

        assert_ne!(a, b);
        drop(a);
        assert_eq!(calls.borrow().deleted_textures, vec![id_a]);
        assert_eq!(b.ref_count(), 1);
        // Backend is still reachable for the survivor.
        assert_eq!(gpu.with_backend(|b| b.texture_slots()), 16);
    }
}
