//! Textures and the single skinned surface material.

use crate::error::{SpecError, SpecResult};

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Wraps an RGBA8 buffer of exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> SpecResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SpecError::TextureSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A texture filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel count, `width * height`.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// PBR surface used by every generated or loaded character mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    base_color: Option<Texture>,
    pub roughness: f32,
    pub metalness: f32,
    pub double_sided: bool,
    pub skinned: bool,
}

impl Material {
    pub const DEFAULT_ROUGHNESS: f32 = 0.7;
    pub const DEFAULT_METALNESS: f32 = 0.1;

    /// Double-sided skinned material with the default roughness and metalness.
    pub fn new(name: impl Into<String>, base_color: Option<Texture>) -> Self {
        Self {
            name: name.into(),
            base_color,
            roughness: Self::DEFAULT_ROUGHNESS,
            metalness: Self::DEFAULT_METALNESS,
            double_sided: true,
            skinned: true,
        }
    }

    pub fn base_color(&self) -> Option<&Texture> {
        self.base_color.as_ref()
    }

    /// Replaces the base color texture, returning the previous one.
    pub fn swap_texture(&mut self, texture: Texture) -> Option<Texture> {
        self.base_color.replace(texture)
    }
}
