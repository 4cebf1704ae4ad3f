//! Error types for data model invariants.

use thiserror::Error;

/// Result type for data model construction.
pub type SpecResult<T> = Result<T, SpecError>;

/// A violated invariant of a skeleton, track, mesh or texture.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    /// Skeleton has no bones at all.
    #[error("skeleton has no bones")]
    EmptySkeleton,

    /// Two bones share a name.
    #[error("duplicate bone name '{name}'")]
    DuplicateBoneName { name: String },

    /// No bone is parentless.
    #[error("skeleton has no root bone")]
    NoRoot,

    /// More than one bone is parentless.
    #[error("skeleton has {count} root bones, expected exactly one")]
    MultipleRoots { count: usize },

    /// A parent index does not point into the skeleton.
    #[error("bone '{bone}' references parent index {parent} but the skeleton has {bone_count} bones")]
    ParentOutOfRange {
        bone: String,
        parent: usize,
        bone_count: usize,
    },

    /// Following parent links from a bone never reaches the root.
    #[error("bone hierarchy contains a cycle through '{bone}'")]
    Cycle { bone: String },

    /// A track identity string could not be parsed.
    #[error("invalid track target '{0}': expected '<node>.<property>'")]
    InvalidTrackTarget(String),

    /// Key times and key values disagree in length.
    #[error("track '{target}' has {times} key times but {values} key values")]
    KeyCountMismatch {
        target: String,
        times: usize,
        values: usize,
    },

    /// Key times are not strictly increasing.
    #[error("track '{target}' key times are not strictly increasing at key {index}")]
    NonIncreasingTimes { target: String, index: usize },

    /// A required vertex attribute is absent.
    #[error("mesh is missing the {0} attribute")]
    MissingAttribute(&'static str),

    /// A vertex attribute has the wrong number of entries.
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A vertex has no positive skin weight.
    #[error("vertex {vertex} has no positive skin weight")]
    UnweightedVertex { vertex: usize },

    /// A skin index does not reference a bone.
    #[error("vertex {vertex} references bone {bone} but the skeleton has {bone_count} bones")]
    BoneIndexOutOfRange {
        vertex: usize,
        bone: u16,
        bone_count: usize,
    },

    /// Triangle index outside the vertex range.
    #[error("triangle index {index} exceeds vertex count {vertex_count}")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    /// Pixel buffer does not match the declared dimensions.
    #[error("texture buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

impl SpecError {
    /// Returns a short stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SpecError::EmptySkeleton => "SKEL_001",
            SpecError::DuplicateBoneName { .. } => "SKEL_002",
            SpecError::NoRoot => "SKEL_003",
            SpecError::MultipleRoots { .. } => "SKEL_004",
            SpecError::ParentOutOfRange { .. } => "SKEL_005",
            SpecError::Cycle { .. } => "SKEL_006",
            SpecError::InvalidTrackTarget(_) => "CLIP_001",
            SpecError::KeyCountMismatch { .. } => "CLIP_002",
            SpecError::NonIncreasingTimes { .. } => "CLIP_003",
            SpecError::MissingAttribute(_) => "MESH_001",
            SpecError::AttributeLength { .. } => "MESH_002",
            SpecError::UnweightedVertex { .. } => "MESH_003",
            SpecError::BoneIndexOutOfRange { .. } => "MESH_004",
            SpecError::IndexOutOfRange { .. } => "MESH_005",
            SpecError::TextureSize { .. } => "TEX_001",
        }
    }
}
