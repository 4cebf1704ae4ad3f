//! Portrait decoding and background keying.

use rigsmith_spec::Texture;

use crate::error::TextureError;

/// Decodes PNG or JPEG bytes into an RGBA texture.
pub fn decode_portrait(bytes: &[u8]) -> Result<Texture, TextureError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty { width, height });
    }
    Ok(Texture::new(width, height, image.into_raw())?)
}

/// Makes near-white pixels fully transparent: any pixel whose red, green and
/// blue channels all exceed `threshold` gets alpha 0. Returns the number of
/// pixels keyed.
pub fn alpha_key(texture: &mut Texture, threshold: u8) -> usize {
    let mut keyed = 0;
    for pixel in texture.pixels_mut().chunks_exact_mut(4) {
        if pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold {
            pixel[3] = 0;
            keyed += 1;
        }
    }
    keyed
}
