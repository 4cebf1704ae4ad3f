//! Error types for rig synthesis.

use rigsmith_spec::{CanonicalRole, SpecError};
use thiserror::Error;

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors from decoding or keying a portrait.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The bytes are not a supported image.
    #[error("failed to decode portrait: {0}")]
    Decode(#[from] image::ImageError),

    /// The image has no pixels.
    #[error("portrait is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },

    /// The decoded buffer does not form a valid texture.
    #[error("invalid portrait buffer: {0}")]
    Buffer(#[from] SpecError),
}

/// Errors from concatenating part geometries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// A part lacks a required attribute.
    #[error("part {part} is missing the {attribute} attribute")]
    MissingAttribute {
        part: usize,
        attribute: &'static str,
    },

    /// A part attribute does not hold one entry per vertex.
    #[error("part {part} {attribute} has {actual} entries, expected {expected}")]
    LengthMismatch {
        part: usize,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors that can occur while synthesizing a rig.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The portrait could not be used.
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// Part geometries could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A generated value broke a data model invariant.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A part anchor or skin influence names a role the skeleton lacks.
    #[error("skeleton has no bone for role {role}")]
    MissingBone { role: CanonicalRole },

    /// Height or arm span is not a positive finite number.
    #[error("invalid {name} measurement: {value}")]
    InvalidMeasurement { name: &'static str, value: f32 },

    /// Configuration JSON could not be parsed.
    #[error("invalid synthesis configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl SynthError {
    /// Returns a short stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SynthError::Texture(_) => "SYN_001",
            SynthError::Merge(_) => "SYN_002",
            SynthError::Spec(err) => err.code(),
            SynthError::MissingBone { .. } => "SYN_003",
            SynthError::InvalidMeasurement { .. } => "SYN_004",
            SynthError::Config(_) => "SYN_005",
        }
    }
}
