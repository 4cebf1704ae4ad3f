//! Texture previews for observers.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rigsmith_spec::Texture;
use tracing::debug;

use crate::data_uri::texture_to_data_uri;
use crate::error::{GlbError, GlbResult};

/// Longest side of a preview image, in pixels.
pub const MAX_PREVIEW_SIZE: u32 = 1024;

/// Picks the texture with the most pixels. Ties keep the first.
pub fn largest_texture<'a, I>(textures: I) -> Option<&'a Texture>
where
    I: IntoIterator<Item = &'a Texture>,
{
    textures.into_iter().fold(None, |best: Option<&Texture>, texture| match best {
        Some(current) if current.area() >= texture.area() => Some(current),
        _ => Some(texture),
    })
}

/// Scales `texture` down so its longest side is at most `max_size`,
/// keeping the aspect ratio. Smaller textures are returned unchanged.
pub fn downscale(texture: &Texture, max_size: u32) -> GlbResult<Texture> {
    let (width, height) = (texture.width(), texture.height());
    let longest = width.max(height);
    if longest <= max_size || max_size == 0 {
        return Ok(texture.clone());
    }

    let scale = max_size as f64 / longest as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    let source = RgbaImage::from_raw(width, height, texture.pixels().to_vec())
        .ok_or(GlbError::MissingBuffer("texture pixels"))?;
    let resized = imageops::resize(&source, new_width, new_height, FilterType::Triangle);
    debug!(width, height, new_width, new_height, "downscaled preview");

    Ok(Texture::new(new_width, new_height, resized.into_raw())?)
}

/// Downscales the texture to the preview size and encodes it as a PNG data URI.
pub fn preview_data_uri(texture: &Texture) -> GlbResult<String> {
    texture_to_data_uri(&downscale(texture, MAX_PREVIEW_SIZE)?)
}
