//! CPU-side RGBA8 images.
//!
//! `Image` is pure data: it never touches the GPU. Textures take a snapshot of
//! an image at upload time, after which the image may be dropped.

use std::fs::File;
use std::io::BufReader;
use std::ops::{Add, Div, Mul, Sub};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};

/// One RGBA8 pixel.
///
/// Arithmetic is per channel and saturating:
/// - `+` / `-` clamp to `[0, 255]`
/// - `*` is `a * b / 255` (multiplicative blend)
/// - `/` is `a * 255 / b` clamped, with division by zero yielding `255`
/// - `* f32` scales and clamps
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);
    pub const BLACK: Pixel = Pixel::new(0, 0, 0, 255);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v, 255)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    fn zip(self, other: Pixel, f: impl Fn(u8, u8) -> u8) -> Pixel {
        Pixel::new(
            f(self.r, other.r),
            f(self.g, other.g),
            f(self.b, other.b),
            f(self.a, other.a),
        )
    }
}

impl From<[u8; 4]> for Pixel {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl Add for Pixel {
    type Output = Pixel;

    fn add(self, rhs: Pixel) -> Pixel {
        self.zip(rhs, u8::saturating_add)
    }
}

impl Sub for Pixel {
    type Output = Pixel;

    fn sub(self, rhs: Pixel) -> Pixel {
        self.zip(rhs, u8::saturating_sub)
    }
}

impl Mul for Pixel {
    type Output = Pixel;

    fn mul(self, rhs: Pixel) -> Pixel {
        self.zip(rhs, |a, b| (u16::from(a) * u16::from(b) / 255) as u8)
    }
}

impl Div for Pixel {
    type Output = Pixel;

    fn div(self, rhs: Pixel) -> Pixel {
        self.zip(rhs, |a, b| {
            if b == 0 {
                255
            } else {
                (u32::from(a) * 255 / u32::from(b)).min(255) as u8
            }
        })
    }
}

impl Mul<f32> for Pixel {
    type Output = Pixel;

    fn mul(self, s: f32) -> Pixel {
        let scale = |c: u8| (f32::from(c) * s).round().clamp(0.0, 255.0) as u8;
        Pixel::new(scale(self.r), scale(self.g), scale(self.b), scale(self.a))
    }
}

/// Row-major RGBA8 raster. Row 0 is the top row.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

fn check_size(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidImageSize { width, height });
    }
    Ok(width as usize * height as usize)
}

impl Image {
    /// Creates a transparent-black image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, Pixel::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
        let len = check_size(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![pixel; len],
        })
    }

    /// Wraps tightly packed RGBA8 bytes, top row first.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let len = check_size(width, height)?;
        if bytes.len() != len * 4 {
            return Err(Error::InvalidImageSize { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice(bytes).to_vec(),
        })
    }

    /// Decodes a PNG file into RGBA8.
    pub fn from_png(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let decoded = image::load(reader, image::ImageFormat::Png)?.to_rgba8();
        log::debug!(
            "decoded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Self::from_rgba8(decoded.width(), decoded.height(), decoded.as_raw())
    }

    /// Encodes the image as an RGBA8 PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba8(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::PixelOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Pixel> {
        let i = self.index(x, y)?;
        Ok(self.pixels[i])
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        let i = self.index(x, y)?;
        self.pixels[i] = pixel;
        Ok(())
    }

    pub fn fill(&mut self, pixel: Pixel) {
        self.pixels.fill(pixel);
    }

    /// Changes the dimensions. Every pixel must be rewritten afterwards; the
    /// previous contents are not preserved.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let len = check_size(width, height)?;
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(len, Pixel::TRANSPARENT);
        Ok(())
    }

    /// Tightly packed RGBA8 bytes, top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.pixels).to_vec()
    }

    /// Tightly packed RGBA8 bytes, bottom row first (GL upload order).
    pub(crate) fn to_rgba8_bottom_up(&self) -> Vec<u8> {
        let row = self.width as usize;
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for line in self.pixels.chunks_exact(row).rev() {
            out.extend_from_slice(bytemuck::cast_slice(line));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── pixel arithmetic ──────────────────────────────────────────────────

    #[test]
    fn add_saturates() {
        let p = Pixel::new(200, 0, 0, 255) + Pixel::new(100, 0, 0, 0);
        assert_eq!(p, Pixel::new(255, 0, 0, 255));
    }

    #[test]
    fn sub_clamps_at_zero() {
        let p = Pixel::new(10, 50, 0, 255) - Pixel::new(20, 25, 0, 255);
        assert_eq!(p, Pixel::new(0, 25, 0, 0));
    }

    #[test]
    fn mul_is_multiplicative_blend() {
        let p = Pixel::new(255, 128, 0, 255) * Pixel::new(255, 255, 255, 128);
        assert_eq!(p, Pixel::new(255, 128, 0, 128));
    }

    #[test]
    fn div_by_zero_is_full() {
        let p = Pixel::new(10, 0, 100, 255) / Pixel::new(0, 0, 200, 255);
        assert_eq!(p, Pixel::new(255, 255, 127, 255));
    }

    #[test]
    fn div_clamps() {
        let p = Pixel::new(200, 0, 0, 0) / Pixel::new(100, 1, 1, 1);
        assert_eq!(p.r, 255);
    }

    #[test]
    fn scalar_mul_clamps() {
        let p = Pixel::new(100, 200, 0, 255) * 2.0;
        assert_eq!(p, Pixel::new(200, 255, 0, 255));
        assert_eq!(Pixel::WHITE * -1.0, Pixel::TRANSPARENT);
    }

    // ── image ─────────────────────────────────────────────────────────────

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Image::new(0, 4),
            Err(Error::InvalidImageSize { width: 0, height: 4 })
        ));
    }

    #[test]
    fn get_set_round_trip_and_bounds() {
        let mut img = Image::new(3, 2).unwrap();
        img.set(2, 1, Pixel::WHITE).unwrap();
        assert_eq!(img.get(2, 1).unwrap(), Pixel::WHITE);
        assert_eq!(img.pixels()[5], Pixel::WHITE);

        assert!(matches!(img.get(3, 0), Err(Error::PixelOutOfRange { .. })));
        assert!(img.set(0, 2, Pixel::BLACK).is_err());
    }

    #[test]
    fn resize_changes_dimensions() {
        let mut img = Image::filled(2, 2, Pixel::WHITE).unwrap();
        img.resize(4, 3).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        assert_eq!(img.pixels().len(), 12);
    }

    #[test]
    fn from_rgba8_checks_length() {
        assert!(Image::from_rgba8(2, 2, &[0; 15]).is_err());
        let img = Image::from_rgba8(1, 1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(img.get(0, 0).unwrap(), Pixel::new(1, 2, 3, 4));
    }

    #[test]
    fn bottom_up_reverses_rows() {
        let mut img = Image::new(1, 2).unwrap();
        img.set(0, 0, Pixel::new(1, 1, 1, 1)).unwrap();
        img.set(0, 1, Pixel::new(2, 2, 2, 2)).unwrap();
        assert_eq!(img.to_rgba8_bottom_up(), vec![2, 2, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn png_round_trip() {
        let path = std::env::temp_dir().join(format!("glint-raster-{}.png", std::process::id()));
        let mut img = Image::filled(3, 2, Pixel::new(10, 20, 30, 255)).unwrap();
        img.set(1, 1, Pixel::new(255, 0, 0, 128)).unwrap();

        img.save_png(&path).unwrap();
        let back = Image::from_png(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back, img);
    }
}
