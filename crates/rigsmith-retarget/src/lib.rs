//! Rigsmith Retargeting
//!
//! Identifies the anatomical role of each joint from its name and rewrites
//! animation clips authored for one skeleton so they drive another.
//!
//! # Example
//!
//! ```
//! use rigsmith_retarget::RoleTable;
//! use rigsmith_spec::CanonicalRole;
//!
//! let table = RoleTable::standard();
//! assert_eq!(table.classify("mixamorig:LeftForeArm"), Some(CanonicalRole::LeftForeArm));
//! assert_eq!(table.classify("Bip001 L UpperArm"), Some(CanonicalRole::LeftArm));
//! assert_eq!(table.classify("Tail_01"), None);
//! ```
//!
//! # Modules
//!
//! - [`classifier`]: Ordered role table
//! - [`remap`]: Track remapping
//! - [`root_motion`]: Hip key normalization
//! - [`adjust`]: T-pose correction and body modifiers
//! - [`procedural`]: Whole-character procedural motion
//! - [`config`]: Serde options

pub mod adjust;
pub mod classifier;
pub mod config;
pub mod error;
pub mod procedural;
pub mod remap;
pub mod root_motion;

pub use adjust::{apply_modifiers, apply_t_pose_correction, T_POSE_ARM_ROTATION};
pub use classifier::{standard_patterns, RoleMap, RolePatterns, RoleTable};
pub use config::{ModelModifiers, RetargetOptions};
pub use error::ClassifierError;
pub use procedural::{procedural_transform, AnimationConfig, Axis, MotionKind};
pub use remap::{clip_name_from_asset, retarget, RetargetReport, Retargeted, Retargeter};
pub use root_motion::{RootMotionNormalizer, RootMotionSettings};
