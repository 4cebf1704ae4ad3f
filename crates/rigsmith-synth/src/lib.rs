//! Rigsmith Procedural Rig Synthesis
//!
//! Builds a rigged, skinned humanoid from a single front-facing portrait:
//!
//! 1. the portrait is decoded and its near-white background keyed out,
//! 2. a canonical 20-bone skeleton is built from height and arm span,
//! 3. primitive body parts are placed on the skeleton's joints and skinned,
//! 4. every part gets planar UVs matching the portrait framing,
//! 5. the parts are merged into one skinned mesh.
//!
//! # Example
//!
//! ```
//! use rigsmith_spec::Texture;
//! use rigsmith_synth::{synthesize_texture, SynthesisConfig};
//!
//! let portrait = Texture::solid(8, 8, [200, 120, 90, 255]);
//! let character = synthesize_texture(portrait, &SynthesisConfig::default()).unwrap();
//! assert_eq!(character.skeleton.bone_count(), 20);
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod portrait;
pub mod primitives;
pub mod skeleton_builder;
pub mod uv;

pub use assembler::{assemble, assemble_mesh, assemble_parts, build_part, part_table, Anchor, PartSpec};
pub use config::SynthesisConfig;
pub use error::{MergeError, SynthError, SynthResult, TextureError};
pub use merge::merge;
pub use pipeline::{synthesize, synthesize_texture, Character};
pub use portrait::{alpha_key, decode_portrait};
pub use primitives::{cuboid, cylinder, sphere, Primitive};
pub use skeleton_builder::build;
pub use uv::{project, WorldBounds};
