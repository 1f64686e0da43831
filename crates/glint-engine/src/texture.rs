//! GPU textures.

use std::rc::Rc;

use crate::device::{Gpu, Handle, Resource, TextureId};
use crate::error::{Error, Result};
use crate::raster::Image;

/// Shared RGBA8 2D texture.
///
/// Width and height live next to the GPU object in the arena, so every clone
/// observes the same dimensions after [`Texture::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    handle: Handle,
}

impl Texture {
    /// Uploads a snapshot of `image`. The image can be dropped afterwards.
    pub fn new(gpu: &Rc<Gpu>, image: &Image) -> Result<Self> {
        gpu.ensure_live()?;
        let (width, height) = (image.width(), image.height());
        let texture = gpu
            .with_backend(|b| b.create_texture(width, height, &image.to_rgba8_bottom_up()))
            .map_err(|e| Error::creation("texture", e))?;

        Ok(Self {
            handle: gpu.insert(Resource::Texture {
                texture,
                width,
                height,
            }),
        })
    }

    /// Replaces the texture contents, in place for every clone.
    pub fn upload(&self, image: &Image) {
        let (width, height) = (image.width(), image.height());
        let gpu = self.handle.gpu();

        let texture = gpu.with_resource_mut(self.handle.key(), |r| match r {
            Resource::Texture {
                texture,
                width: w,
                height: h,
            } => {
                *w = width;
                *h = height;
                Some(*texture)
            }
            _ => None,
        });

        if let Some(Some(texture)) = texture {
            gpu.with_live_backend(|b| {
                b.upload_texture(texture, width, height, &image.to_rgba8_bottom_up())
            });
        }
    }

    /// Binds the texture to texture unit `slot`.
    pub fn bind(&self, slot: u32) -> Result<()> {
        let gpu = self.handle.gpu();
        let max = gpu.with_backend(|b| b.texture_slots());
        if slot >= max {
            return Err(Error::TextureSlotOutOfRange { slot, max });
        }

        if let Some((texture, _, _)) = self.describe() {
            gpu.with_live_backend(|b| b.bind_texture(slot, texture));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.describe().map_or(0, |(_, w, _)| w)
    }

    pub fn height(&self) -> u32 {
        self.describe().map_or(0, |(_, _, h)| h)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn describe(&self) -> Option<(TextureId, u32, u32)> {
        self.handle
            .gpu()
            .with_resource(self.handle.key(), |r| match r {
                Resource::Texture {
                    texture,
                    width,
                    height,
                } => Some((*texture, *width, *height)),
                _ => None,
            })
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::RecordingBackend;
    use crate::raster::Pixel;

    #[test]
    fn dimensions_follow_the_source_image() {
        let (backend, _) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let tex = Texture::new(&gpu, &Image::new(7, 3).unwrap()).unwrap();

        assert_eq!((tex.width(), tex.height()), (7, 3));
    }

    #[test]
    fn creation_fails_after_context_loss() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        gpu.invalidate();

        let result = Texture::new(&gpu, &Image::new(1, 1).unwrap());
        assert!(matches!(result, Err(Error::Context(_))));
        assert!(calls.borrow().textures.is_empty());
        assert_eq!(gpu.live_resources(), 0);
    }

    #[test]
    fn upload_updates_every_clone() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let tex = Texture::new(&gpu, &Image::new(2, 2).unwrap()).unwrap();
        let alias = tex.clone();

        let mut img = Image::new(1, 2).unwrap();
        img.set(0, 0, Pixel::WHITE).unwrap();
        tex.upload(&img);

        assert_eq!((alias.width(), alias.height()), (1, 2));
        let calls = calls.borrow();
        let (_, w, h, bytes) = &calls.uploads[0];
        assert_eq!((*w, *h), (1, 2));
        // Top row of the image is uploaded last.
        assert_eq!(&bytes[4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn bind_validates_slot() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let tex = Texture::new(&gpu, &Image::new(1, 1).unwrap()).unwrap();

        tex.bind(3).unwrap();
        assert!(matches!(
            tex.bind(16),
            Err(Error::TextureSlotOutOfRange { slot: 16, max: 16 })
        ));
        assert_eq!(calls.borrow().bound_textures.len(), 1);
        assert_eq!(calls.borrow().bound_textures[0].0, 3);
    }

    #[test]
    fn last_clone_deletes_texture() {
        let (backend, calls) = RecordingBackend::new();
        let gpu = Gpu::new(backend);
        let tex = Texture::new(&gpu, &Image::new(1, 1).unwrap()).unwrap();
        let alias = tex.clone();

        drop(tex);
        assert!(calls.borrow().deleted_textures.is_empty());
        drop(alias);
        assert_eq!(calls.borrow().deleted_textures.len(), 1);
    }
}
