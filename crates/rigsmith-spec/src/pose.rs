//! Mutable per-frame skeleton state.

use glam::{Mat4, Vec3};

use crate::clip::{AnimationClip, TrackValue};
use crate::skeleton::{BoneTransform, Skeleton};

/// Local transforms for every bone of a skeleton plus a uniform-or-not scale
/// applied above the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// One local transform per bone, indexed like the skeleton.
    pub locals: Vec<BoneTransform>,
    /// Scale applied to the whole character.
    pub root_scale: Vec3,
}

impl Pose {
    /// The bind pose of `skeleton`.
    pub fn rest(skeleton: &Skeleton) -> Self {
        Self {
            locals: skeleton.bones().iter().map(|bone| bone.rest).collect(),
            root_scale: Vec3::ONE,
        }
    }

    /// Rest pose overridden by every track of `clip` sampled at `time`.
    /// Tracks whose node is not a bone of `skeleton` are ignored.
    pub fn sample_clip(skeleton: &Skeleton, clip: &AnimationClip, time: f32) -> Self {
        let mut pose = Self::rest(skeleton);
        for track in &clip.tracks {
            let Some(index) = skeleton.bone_index(track.node()) else {
                continue;
            };
            let local = &mut pose.locals[index];
            match track.sample(time) {
                Some(TrackValue::Position(translation)) => local.translation = translation,
                Some(TrackValue::Rotation(rotation)) => local.rotation = rotation,
                Some(TrackValue::Scale(scale)) => local.scale = scale,
                None => {}
            }
        }
        pose
    }

    pub fn local(&self, index: usize) -> Option<&BoneTransform> {
        self.locals.get(index)
    }

    pub fn local_mut(&mut self, index: usize) -> Option<&mut BoneTransform> {
        self.locals.get_mut(index)
    }

    /// Model-space matrices, with the root scale applied above the root bone.
    pub fn world_matrices(&self, skeleton: &Skeleton) -> Vec<Mat4> {
        let scale = Mat4::from_scale(self.root_scale);
        skeleton
            .compose(&self.locals)
            .into_iter()
            .map(|matrix| scale * matrix)
            .collect()
    }

    /// Skinning matrices: world matrix times inverse bind matrix.
    pub fn skinning_matrices(&self, skeleton: &Skeleton) -> Vec<Mat4> {
        self.world_matrices(skeleton)
            .into_iter()
            .zip(skeleton.inverse_bind_matrices())
            .map(|(world, inverse_bind)| world * inverse_bind)
            .collect()
    }
}
