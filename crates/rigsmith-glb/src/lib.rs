//! Rigsmith Binary glTF Container
//!
//! Serializes skinned characters and their clips into GLB (`model/gltf-binary`)
//! containers and decodes them back with the `gltf` crate. Also hosts the PNG
//! and data-URI helpers used for embedded and previewed textures.
//!
//! # Example
//!
//! ```
//! use rigsmith_glb::{decode, serialize};
//! use rigsmith_spec::glam::Vec3;
//! use rigsmith_spec::{Bone, BoneTransform, Geometry, Material, Skeleton, SkinnedMesh};
//!
//! let skeleton = Skeleton::new(vec![Bone::new(
//!     "Hips",
//!     None,
//!     BoneTransform::from_translation(Vec3::Y),
//! )])
//! .unwrap();
//! let geometry = Geometry {
//!     positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
//!     uvs: Some(vec![[0.0, 0.0]; 3]),
//!     skin_indices: Some(vec![[0; 4]; 3]),
//!     skin_weights: Some(vec![[1.0, 0.0, 0.0, 0.0]; 3]),
//!     indices: None,
//! };
//! let mesh = SkinnedMesh::new("Body", geometry).unwrap();
//!
//! let glb = serialize(&skeleton, &mesh, &Material::new("Skin", None), &[]).unwrap();
//! let asset = decode(&glb).unwrap();
//! assert_eq!(asset.skeleton.bone_count(), 1);
//! ```

pub mod data_uri;
pub mod error;
pub mod png;
pub mod preview;
pub mod reader;
pub mod writer;

pub use data_uri::{
    decode_data_uri, encode_data_uri, texture_from_data_uri, texture_to_data_uri, PNG_MIME,
};
pub use error::{GlbError, GlbResult};
pub use self::png::{encode_png, encode_png_with, PngConfig};
pub use preview::{downscale, largest_texture, preview_data_uri, MAX_PREVIEW_SIZE};
pub use reader::{decode, decode_clips, CharacterAsset, ClipSet};
pub use writer::serialize;

/// MIME type of serialized containers.
pub const GLB_MIME: &str = "model/gltf-binary";
