//! Immutable bone hierarchy.
//!
//! A [`Skeleton`] is built once per character and never mutated afterwards;
//! per-frame animation state lives in [`crate::Pose`]. Bone order is the index
//! space used by skin weights.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::error::{SpecError, SpecResult};
use crate::role::CanonicalRole;

/// Local translation, rotation and scale of a bone relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// A pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Converts to a 4x4 matrix (scale, then rotation, then translation).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A single joint.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Unique bone name.
    pub name: String,
    /// Anatomical role, when known.
    pub role: Option<CanonicalRole>,
    /// Index of the parent bone within the owning skeleton.
    pub parent: Option<usize>,
    /// Rest (bind) transform relative to the parent.
    pub rest: BoneTransform,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<usize>, rest: BoneTransform) -> Self {
        Self {
            name: name.into(),
            role: None,
            parent,
            rest,
        }
    }

    /// Sets the anatomical role.
    pub fn with_role(mut self, role: CanonicalRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Local bind rotation.
    pub fn bind_rotation(&self) -> Quat {
        self.rest.rotation
    }
}

/// Validated, immutable bone hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
    root: usize,
    children: Vec<Vec<usize>>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Builds a skeleton, checking that the bones form a single tree with
    /// unique names.
    pub fn new(bones: Vec<Bone>) -> SpecResult<Self> {
        if bones.is_empty() {
            return Err(SpecError::EmptySkeleton);
        }

        let bone_count = bones.len();
        let mut by_name = HashMap::with_capacity(bone_count);
        for (index, bone) in bones.iter().enumerate() {
            if by_name.insert(bone.name.clone(), index).is_some() {
                return Err(SpecError::DuplicateBoneName {
                    name: bone.name.clone(),
                });
            }
        }

        let mut children = vec![Vec::new(); bone_count];
        let mut roots = Vec::new();
        for (index, bone) in bones.iter().enumerate() {
            match bone.parent {
                None => roots.push(index),
                Some(parent) if parent >= bone_count => {
                    return Err(SpecError::ParentOutOfRange {
                        bone: bone.name.clone(),
                        parent,
                        bone_count,
                    });
                }
                Some(parent) => children[parent].push(index),
            }
        }

        let root = match roots.as_slice() {
            [] => return Err(SpecError::NoRoot),
            [root] => *root,
            _ => return Err(SpecError::MultipleRoots { count: roots.len() }),
        };

        // Every bone must reach the root within bone_count steps.
        for (index, bone) in bones.iter().enumerate() {
            let mut current = index;
            let mut steps = 0;
            while let Some(parent) = bones[current].parent {
                current = parent;
                steps += 1;
                if steps > bone_count {
                    return Err(SpecError::Cycle {
                        bone: bone.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            bones,
            root,
            children,
            by_name,
        })
    }

    /// Bones in index order.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Index of the single root bone.
    pub fn root(&self) -> usize {
        self.root
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Exact (case-sensitive) name lookup.
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// First bone carrying the given role, in index order.
    pub fn bone_by_role(&self, role: CanonicalRole) -> Option<usize> {
        self.bones.iter().position(|bone| bone.role == Some(role))
    }

    /// Bone names in index order.
    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.iter().map(|bone| bone.name.as_str())
    }

    /// Number of bones with no parent. Always 1 for a constructed skeleton.
    pub fn root_count(&self) -> usize {
        self.bones.iter().filter(|bone| bone.parent.is_none()).count()
    }

    /// Bone indices in depth-first order starting at the root, parents before
    /// children.
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.children[index].iter().rev());
        }
        order
    }

    /// Model-space rest matrices, one per bone.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let locals: Vec<BoneTransform> = self.bones.iter().map(|bone| bone.rest).collect();
        self.compose(&locals)
    }

    /// Model-space rest position of each bone.
    pub fn world_positions(&self) -> Vec<Vec3> {
        self.world_matrices()
            .iter()
            .map(|matrix| matrix.w_axis.truncate())
            .collect()
    }

    /// Inverse of each bone's model-space rest matrix.
    pub fn inverse_bind_matrices(&self) -> Vec<Mat4> {
        self.world_matrices()
            .iter()
            .map(|matrix| matrix.inverse())
            .collect()
    }

    /// Composes local transforms (indexed like the bones) into model space.
    pub fn compose(&self, locals: &[BoneTransform]) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.bones.len()];
        for index in self.depth_first() {
            let local = locals
                .get(index)
                .copied()
                .unwrap_or(self.bones[index].rest)
                .to_matrix();
            world[index] = match self.bones[index].parent {
                Some(parent) => world[parent] * local,
                None => local,
            };
        }
        world
    }

    /// Returns a copy with the given roles assigned. Bones not listed keep
    /// their current role.
    pub fn with_roles(&self, assignments: &[(usize, CanonicalRole)]) -> Self {
        let mut skeleton = self.clone();
        for &(index, role) in assignments {
            if let Some(bone) = skeleton.bones.get_mut(index) {
                bone.role = Some(role);
            }
        }
        skeleton
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain() -> Vec<Bone> {
        vec![
            Bone::new("root", None, BoneTransform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            Bone::new("spine", Some(0), BoneTransform::from_translation(Vec3::new(0.0, 0.5, 0.0))),
            Bone::new("head", Some(1), BoneTransform::from_translation(Vec3::new(0.0, 0.25, 0.0))),
        ]
    }

    #[test]
    fn test_skeleton_bone_hierarchy() {
        let skeleton = Skeleton::new(chain()).unwrap();

        assert_eq!(skeleton.bone_count(), 3);
        assert_eq!(skeleton.root(), 0);
        assert_eq!(skeleton.bone_index("spine"), Some(1));
        assert_eq!(skeleton.bone_index("Spine"), None);
        assert_eq!(skeleton.children(0), &[1]);
        assert_eq!(skeleton.depth_first(), vec![0, 1, 2]);
    }

    #[test]
    fn test_world_positions_accumulate() {
        let skeleton = Skeleton::new(chain()).unwrap();
        let positions = skeleton.world_positions();
        assert!((positions[2].y - 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_bind_matrices_undo_world() {
        let skeleton = Skeleton::new(chain()).unwrap();
        let world = skeleton.world_matrices();
        let inverse = skeleton.inverse_bind_matrices();
        for (w, i) in world.iter().zip(inverse.iter()) {
            assert!((*w * *i).abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_parent_may_follow_child() {
        let bones = vec![
            Bone::new("hand", Some(1), BoneTransform::IDENTITY),
            Bone::new("arm", None, BoneTransform::IDENTITY),
        ];
        let skeleton = Skeleton::new(bones).unwrap();
        assert_eq!(skeleton.root(), 1);
        assert_eq!(skeleton.depth_first(), vec![1, 0]);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut bones = chain();
        bones[2].name = "spine".to_string();
        assert_eq!(
            Skeleton::new(bones),
            Err(SpecError::DuplicateBoneName {
                name: "spine".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_multiple_roots() {
        let mut bones = chain();
        bones[2].parent = None;
        assert_eq!(
            Skeleton::new(bones),
            Err(SpecError::MultipleRoots { count: 2 })
        );
    }

    #[test]
    fn test_rejects_cycles() {
        let bones = vec![
            Bone::new("root", None, BoneTransform::IDENTITY),
            Bone::new("a", Some(2), BoneTransform::IDENTITY),
            Bone::new("b", Some(1), BoneTransform::IDENTITY),
        ];
        let err = Skeleton::new(bones).unwrap_err();
        assert_eq!(err.code(), "SKEL_006");
    }

    #[test]
    fn test_rejects_out_of_range_parent() {
        let mut bones = chain();
        bones[1].parent = Some(7);
        assert!(matches!(
            Skeleton::new(bones),
            Err(SpecError::ParentOutOfRange { parent: 7, .. })
        ));
    }

    #[test]
    fn test_with_roles() {
        let skeleton = Skeleton::new(chain()).unwrap();
        let annotated = skeleton.with_roles(&[(0, CanonicalRole::Hips), (2, CanonicalRole::Head)]);
        assert_eq!(annotated.bone_by_role(CanonicalRole::Head), Some(2));
        assert_eq!(skeleton.bone_by_role(CanonicalRole::Head), None);
    }
}
