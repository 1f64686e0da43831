//! Path-keyed caches of GPU resources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::device::Gpu;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::mesh::Mesh;
use crate::raster::Image;
use crate::shader::Shader;
use crate::texture::Texture;

/// Loads each asset once and hands out shared handles afterwards.
///
/// Relative paths resolve against `root`. Failed loads are not cached, so a
/// fixed file is picked up by the next request.
pub struct Assets {
    gpu: Rc<Gpu>,
    root: PathBuf,
    textures: HashMap<PathBuf, Texture>,
    meshes: HashMap<PathBuf, Mesh>,
    shaders: HashMap<PathBuf, Shader>,
}

impl Assets {
    pub fn new(gpu: Rc<Gpu>, root: impl Into<PathBuf>) -> Self {
        Self {
            gpu,
            root: root.into(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            shaders: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// PNG texture at `path`.
    pub fn texture(&mut self, path: impl AsRef<Path>) -> Result<Texture> {
        let path = self.root.join(path);
        if let Some(texture) = self.textures.get(&path) {
            return Ok(texture.clone());
        }

        let texture = Texture::new(&self.gpu, &Image::from_png(&path)?)?;
        log::debug!("loaded texture {}", path.display());
        self.textures.insert(path, texture.clone());
        Ok(texture)
    }

    /// Wavefront OBJ mesh at `path`.
    pub fn mesh(&mut self, path: impl AsRef<Path>) -> Result<Mesh> {
        let path = self.root.join(path);
        if let Some(mesh) = self.meshes.get(&path) {
            return Ok(mesh.clone());
        }

        let mesh = Mesh::new(&self.gpu, &Geometry::from_obj(&path)?)?;
        log::debug!("loaded mesh {}", path.display());
        self.meshes.insert(path, mesh.clone());
        Ok(mesh)
    }

    /// Shader built from the stage files `name.vert`, `name.frag`, ...
    pub fn shader(&mut self, name: impl AsRef<Path>) -> Result<Shader> {
        let name = self.root.join(name);
        if let Some(shader) = self.shaders.get(&name) {
            return Ok(shader.clone());
        }

        let shader = Shader::from_files(&self.gpu, &name)?;
        log::debug!("loaded shader {}", name.display());
        self.shaders.insert(name, shader.clone());
        Ok(shader)
    }

    /// Number of cached assets of all kinds.
    pub fn len(&self) -> usize {
        self.textures.len() + self.meshes.len() + self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached handle. GPU objects still referenced elsewhere live on.
    pub fn clear(&mut self) {
        log::debug!("clearing {} cached asset(s)", self.len());
        self.textures.clear();
        self.meshes.clear();
        self.shaders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::RecordingBackend;
    use crate::error::Error;
    use crate::raster::Pixel;

    /// Scratch directory removed on drop.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("glint-assets-{tag}-{}", std::process::id()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn texture_is_loaded_once() {
        let dir = Scratch::new("tex");
        Image::filled(2, 2, Pixel::WHITE)
            .unwrap()
            .save_png(dir.0.join("white.png"))
            .unwrap();

        let (backend, calls) = RecordingBackend::new();
        let mut assets = Assets::new(Gpu::new(backend), &dir.0);

        let a = assets.texture("white.png").unwrap();
        let b = assets.texture("white.png").unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.borrow().textures.len(), 1);
        assert_eq!(a.handle().ref_count(), 3);
    }

    #[test]
    fn mesh_and_shader_are_cached_by_path() {
        let dir = Scratch::new("mesh");
        std::fs::write(dir.0.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        std::fs::write(dir.0.join("flat.vert"), "void main() {}").unwrap();
        std::fs::write(dir.0.join("flat.frag"), "void main() {}").unwrap();

        let (backend, calls) = RecordingBackend::new();
        let mut assets = Assets::new(Gpu::new(backend), &dir.0);

        let mesh = assets.mesh("tri.obj").unwrap();
        assets.mesh("tri.obj").unwrap();
        assets.shader("flat").unwrap();
        assets.shader("flat").unwrap();

        assert_eq!(mesh.index_count(crate::device::Primitive::Triangles), 3);
        assert_eq!(calls.borrow().vertex_arrays.len(), 1);
        assert_eq!(calls.borrow().linked.len(), 1);
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = Scratch::new("missing");
        let (backend, _) = RecordingBackend::new();
        let mut assets = Assets::new(Gpu::new(backend), &dir.0);

        assert!(matches!(assets.texture("nope.png"), Err(Error::Io(_))));
        assert!(assets.is_empty());
    }

    #[test]
    fn clear_releases_unshared_resources() {
        let dir = Scratch::new("clear");
        Image::filled(1, 1, Pixel::BLACK)
            .unwrap()
            .save_png(dir.0.join("a.png"))
            .unwrap();
        Image::filled(1, 1, Pixel::WHITE)
            .unwrap()
            .save_png(dir.0.join("b.png"))
            .unwrap();

        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let mut assets = Assets::new(Rc::clone(&gpu), &dir.0);

        let kept = assets.texture("a.png").unwrap();
        assets.texture("b.png").unwrap();
        assets.clear();

        assert_eq!(calls.borrow().deleted_textures.len(), 1);
        assert_eq!(gpu.live_resources(), 1);
        drop(kept);
        assert_eq!(gpu.live_resources(), 0);
    }
}
