//! Error types for container encoding and decoding.

use rigsmith_spec::SpecError;
use thiserror::Error;

/// Result type for container operations.
pub type GlbResult<T> = Result<T, GlbError>;

/// Errors that can occur while writing or reading a binary glTF container.
#[derive(Debug, Error)]
pub enum GlbError {
    /// Failed to serialize the glTF JSON chunk.
    #[error("failed to serialize glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to encode a texture as PNG.
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    /// Failed to decode an embedded or supplied image.
    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),

    /// The container is not valid glTF.
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    /// A data URI payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A string is not a base64 data URI.
    #[error("not a base64 data URI: '{0}'")]
    InvalidDataUri(String),

    /// Buffer data referenced by an accessor is unavailable.
    #[error("glTF buffer data for {0} is missing")]
    MissingBuffer(&'static str),

    /// The container holds no node usable as a skeleton.
    #[error("container has no skeleton")]
    NoSkeleton,

    /// The container exceeds the 4 GiB GLB size limit.
    #[error("container size {0} exceeds the GLB limit")]
    TooLarge(usize),

    /// Decoded data broke a data model invariant.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

impl GlbError {
    /// Returns a short stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            GlbError::Json(_) => "GLB_001",
            GlbError::Png(_) => "GLB_002",
            GlbError::Image(_) => "GLB_003",
            GlbError::Gltf(_) => "GLB_004",
            GlbError::Base64(_) => "GLB_005",
            GlbError::InvalidDataUri(_) => "GLB_006",
            GlbError::MissingBuffer(_) => "GLB_007",
            GlbError::NoSkeleton => "GLB_008",
            GlbError::TooLarge(_) => "GLB_009",
            GlbError::Spec(err) => err.code(),
        }
    }
}
