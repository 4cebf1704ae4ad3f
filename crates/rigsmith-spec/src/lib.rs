//! Rigsmith Data Model
//!
//! Shared types for skeletal characters: the canonical role vocabulary, the
//! immutable [`Skeleton`], per-frame [`Pose`] state, keyframed
//! [`AnimationClip`]s, skinned geometry and materials.
//!
//! Every type with an invariant is built through a fallible constructor that
//! reports a [`SpecError`]; once constructed, values are valid for their whole
//! lifetime.
//!
//! # Example
//!
//! ```
//! use rigsmith_spec::glam::Vec3;
//! use rigsmith_spec::{Bone, BoneTransform, CanonicalRole, Skeleton};
//!
//! let skeleton = Skeleton::new(vec![
//!     Bone::new("Hips", None, BoneTransform::from_translation(Vec3::Y))
//!         .with_role(CanonicalRole::Hips),
//!     Bone::new("Spine", Some(0), BoneTransform::from_translation(Vec3::Y * 0.2))
//!         .with_role(CanonicalRole::Spine),
//! ])
//! .unwrap();
//!
//! assert_eq!(skeleton.bone_by_role(CanonicalRole::Spine), Some(1));
//! ```
//!
//! # Modules
//!
//! - [`role`]: Canonical anatomical roles
//! - [`skeleton`]: Bones and the validated hierarchy
//! - [`pose`]: Mutable local transforms
//! - [`clip`]: Tracks, keyframes and clips
//! - [`mesh`]: Geometry buffers and skinned meshes
//! - [`material`]: Textures and materials
//! - [`error`]: Invariant violations

pub mod clip;
pub mod error;
pub mod material;
pub mod mesh;
pub mod pose;
pub mod role;
pub mod skeleton;

pub use clip::{
    AnimationClip, Interpolation, Keyframes, Track, TrackProperty, TrackTarget, TrackValue,
};
pub use error::{SpecError, SpecResult};
pub use material::{Material, Texture};
pub use mesh::{Bounds, Geometry, SkinnedMesh, MAX_INFLUENCES};
pub use pose::Pose;
pub use role::CanonicalRole;
pub use skeleton::{Bone, BoneTransform, Skeleton};

pub use glam;
