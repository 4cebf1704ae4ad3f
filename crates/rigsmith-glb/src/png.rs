//! Deterministic PNG encoding of RGBA textures.
//!
//! Fixed compression and filter settings keep the encoded bytes identical for
//! identical pixels, so serialized containers are reproducible.

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use rigsmith_spec::Texture;

use crate::error::GlbResult;

/// PNG encoder settings.
#[derive(Debug, Clone)]
pub struct PngConfig {
    pub compression: Compression,
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Smaller output at the cost of encode time.
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }
}

/// Encodes a texture as an 8-bit RGBA PNG with default settings.
pub fn encode_png(texture: &Texture) -> GlbResult<Vec<u8>> {
    encode_png_with(texture, &PngConfig::default())
}

/// Encodes a texture as an 8-bit RGBA PNG.
pub fn encode_png_with(texture: &Texture, config: &PngConfig) -> GlbResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, texture.width(), texture.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(config.compression);
        encoder.set_filter(config.filter);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(texture.pixels())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_is_deterministic() {
        let texture = Texture::solid(3, 2, [10, 20, 30, 255]);
        let a = encode_png(&texture).unwrap();
        let b = encode_png(&texture).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[1..4], b"PNG");
    }

    #[test]
    fn test_encode_decodes_back() {
        let mut texture = Texture::solid(2, 2, [0, 0, 0, 255]);
        texture.pixels_mut()[0..4].copy_from_slice(&[255, 0, 0, 128]);
        let bytes = encode_png_with(&texture, &PngConfig::best_compression()).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.as_raw().as_slice(), texture.pixels());
    }
}
