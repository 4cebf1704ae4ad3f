//! `data:` URI helpers for embedded images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rigsmith_spec::Texture;

use crate::error::{GlbError, GlbResult};
use crate::png::encode_png;

pub const PNG_MIME: &str = "image/png";

/// Wraps encoded bytes in a base64 data URI.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Splits a base64 data URI into its MIME type and decoded payload.
pub fn decode_data_uri(uri: &str) -> GlbResult<(String, Vec<u8>)> {
    let invalid = || GlbError::InvalidDataUri(truncate(uri));
    let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime_type.to_string(), bytes))
}

/// PNG-encodes a texture as a `data:image/png;base64,` URI.
pub fn texture_to_data_uri(texture: &Texture) -> GlbResult<String> {
    Ok(encode_data_uri(PNG_MIME, &encode_png(texture)?))
}

/// Decodes an image data URI (any format `image` understands) to RGBA.
pub fn texture_from_data_uri(uri: &str) -> GlbResult<Texture> {
    let (_, bytes) = decode_data_uri(uri)?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Texture::new(width, height, rgba.into_raw())?)
}

fn truncate(uri: &str) -> String {
    uri.chars().take(32).collect()
}
