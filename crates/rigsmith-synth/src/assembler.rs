//! Primitive body parts bound to a canonical skeleton.
//!
//! Each entry of the part table names a primitive solid, the joint (or pair
//! of joints) it sits on, a fixed offset, rotation and scale, and the bones
//! that deform it. Right-side parts are mirror images of the left-side
//! entries.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use rigsmith_spec::{CanonicalRole, Geometry, Skeleton, SkinnedMesh, MAX_INFLUENCES};
use tracing::debug;

use crate::config::SynthesisConfig;
use crate::error::{SynthError, SynthResult};
use crate::merge::merge;
use crate::primitives::Primitive;
use crate::uv::{project, WorldBounds};

/// Where a part sits on the skeleton's rest pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// At a joint.
    Joint(CanonicalRole),
    /// Halfway between two joints.
    Between(CanonicalRole, CanonicalRole),
}

impl Anchor {
    fn mirrored(self) -> Self {
        match self {
            Anchor::Joint(role) => Anchor::Joint(role.mirror()),
            Anchor::Between(a, b) => Anchor::Between(a.mirror(), b.mirror()),
        }
    }
}

/// One entry of the part table.
#[derive(Debug, Clone, PartialEq)]
pub struct PartSpec {
    pub name: String,
    pub primitive: Primitive,
    pub anchor: Anchor,
    /// Offset from the anchor.
    pub offset: Vec3,
    /// Euler angles in radians, applied about X, then Y, then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Bones deforming the part with their weights, at most four.
    pub influences: Vec<(CanonicalRole, f32)>,
}

impl PartSpec {
    fn new(name: &str, primitive: Primitive, anchor: Anchor, bone: CanonicalRole) -> Self {
        Self {
            name: name.to_string(),
            primitive,
            anchor,
            offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            influences: vec![(bone, 1.0)],
        }
    }

    fn offset(mut self, x: f32, y: f32, z: f32) -> Self {
        self.offset = Vec3::new(x, y, z);
        self
    }

    fn rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    fn scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vec3::new(x, y, z);
        self
    }

    fn influences(mut self, influences: &[(CanonicalRole, f32)]) -> Self {
        self.influences = influences.to_vec();
        self
    }

    /// The same part reflected across the YZ plane onto the other side.
    pub fn mirrored(&self) -> Self {
        let name = match self.name.strip_prefix("left_") {
            Some(rest) => format!("right_{rest}"),
            None => self.name.clone(),
        };
        Self {
            name,
            primitive: self.primitive,
            anchor: self.anchor.mirrored(),
            offset: self.offset * Vec3::new(-1.0, 1.0, 1.0),
            rotation: self.rotation * Vec3::new(1.0, -1.0, -1.0),
            scale: self.scale,
            influences: self
                .influences
                .iter()
                .map(|&(role, weight)| (role.mirror(), weight))
                .collect(),
        }
    }

    /// Local transform: rotate, then scale, then translate by the offset.
    fn local_matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x);
        Mat4::from_translation(self.offset) * Mat4::from_scale(self.scale) * rotation
    }
}

fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Primitive {
    Primitive::Sphere {
        radius,
        width_segments,
        height_segments,
    }
}

fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Primitive {
    Primitive::Cylinder {
        radius_top,
        radius_bottom,
        height,
        radial_segments: 12,
    }
}

fn cuboid(width: f32, height: f32, depth: f32) -> Primitive {
    Primitive::Cuboid {
        width,
        height,
        depth,
    }
}

/// The default humanoid part table: six center parts followed by ten left
/// and ten right limb parts.
pub fn part_table() -> Vec<PartSpec> {
    use Anchor::{Between, Joint};
    use CanonicalRole::*;

    let mut parts = vec![
        PartSpec::new("head", sphere(0.1, 16, 16), Joint(Head), Head)
            .offset(0.0, 0.05, -0.02)
            .scale(0.92, 1.1, 1.0),
        PartSpec::new("face", cylinder(0.09, 0.07, 0.16), Joint(Head), Head)
            .offset(0.0, 0.01, 0.02)
            .scale(1.0, 1.0, 0.8),
        PartSpec::new("nose", cuboid(0.03, 0.06, 0.04), Joint(Head), Head)
            .offset(0.0, 0.02, 0.11)
            .rotation(-0.1, 0.0, 0.0),
        PartSpec::new("neck", cylinder(0.065, 0.075, 0.15), Between(Neck, Head), Neck),
        // Blended across the waist so bending the spine does not tear the torso.
        PartSpec::new("chest", cylinder(0.18, 0.14, 0.45), Joint(Spine1), Spine1)
            .offset(0.0, 0.05, 0.0)
            .scale(1.0, 1.0, 0.7)
            .influences(&[(Spine1, 0.7), (Spine, 0.3)]),
        PartSpec::new("pelvis", cylinder(0.13, 0.14, 0.25), Between(Hips, Spine), Hips)
            .scale(1.0, 1.0, 0.75),
    ];

    let left = [
        PartSpec::new(
            "left_shoulder",
            sphere(0.07, 12, 8),
            Between(LeftShoulder, LeftArm),
            LeftShoulder,
        ),
        PartSpec::new(
            "left_upper_arm",
            cylinder(0.055, 0.05, 0.28),
            Between(LeftArm, LeftForeArm),
            LeftArm,
        )
        .rotation(0.0, 0.0, -FRAC_PI_2),
        PartSpec::new("left_elbow", sphere(0.05, 12, 8), Joint(LeftForeArm), LeftArm),
        PartSpec::new(
            "left_forearm",
            cylinder(0.05, 0.04, 0.25),
            Between(LeftForeArm, LeftHand),
            LeftForeArm,
        )
        .rotation(0.0, 0.0, -FRAC_PI_2),
        PartSpec::new("left_hand", cuboid(0.08, 0.1, 0.04), Joint(LeftHand), LeftHand)
            .offset(0.04, 0.0, 0.0),
        PartSpec::new("left_hip", sphere(0.08, 12, 8), Joint(LeftUpLeg), LeftUpLeg),
        PartSpec::new(
            "left_thigh",
            cylinder(0.08, 0.06, 0.42),
            Between(LeftUpLeg, LeftLeg),
            LeftUpLeg,
        ),
        PartSpec::new("left_knee", sphere(0.06, 12, 8), Joint(LeftLeg), LeftUpLeg),
        PartSpec::new(
            "left_shin",
            cylinder(0.06, 0.05, 0.42),
            Between(LeftLeg, LeftFoot),
            LeftLeg,
        ),
        PartSpec::new("left_foot", cuboid(0.08, 0.06, 0.18), Joint(LeftFoot), LeftFoot)
            .offset(0.0, -0.08, 0.05),
    ];

    let right: Vec<PartSpec> = left.iter().map(PartSpec::mirrored).collect();
    parts.extend(left);
    parts.extend(right);
    parts
}

fn bone_for(skeleton: &Skeleton, role: CanonicalRole) -> SynthResult<usize> {
    skeleton
        .bone_by_role(role)
        .ok_or(SynthError::MissingBone { role })
}

fn anchor_position(skeleton: &Skeleton, world: &[Vec3], anchor: Anchor) -> SynthResult<Vec3> {
    Ok(match anchor {
        Anchor::Joint(role) => world[bone_for(skeleton, role)?],
        Anchor::Between(a, b) => {
            (world[bone_for(skeleton, a)?] + world[bone_for(skeleton, b)?]) * 0.5
        }
    })
}

/// Builds one part in model space, non-indexed and uniformly skinned.
pub fn build_part(spec: &PartSpec, skeleton: &Skeleton, world: &[Vec3]) -> SynthResult<Geometry> {
    let anchor = anchor_position(skeleton, world, spec.anchor)?;

    let mut joints = [0u16; MAX_INFLUENCES];
    let mut weights = [0.0f32; MAX_INFLUENCES];
    for (slot, &(role, weight)) in spec.influences.iter().take(MAX_INFLUENCES).enumerate() {
        joints[slot] = bone_for(skeleton, role)? as u16;
        weights[slot] = weight;
    }

    let mut geometry = spec.primitive.build().to_non_indexed();
    geometry.apply_matrix(Mat4::from_translation(anchor) * spec.local_matrix());
    geometry.set_uniform_skin(joints, weights);
    Ok(geometry)
}

/// Builds every part of the default table against `skeleton`'s rest pose.
pub fn assemble(skeleton: &Skeleton) -> SynthResult<Vec<Geometry>> {
    assemble_parts(skeleton, &part_table())
}

/// Builds the given parts, in order.
pub fn assemble_parts(skeleton: &Skeleton, table: &[PartSpec]) -> SynthResult<Vec<Geometry>> {
    let world = skeleton.world_positions();
    table
        .iter()
        .map(|spec| build_part(spec, skeleton, &world))
        .collect()
}

/// Assembles, projects and merges the default parts into one skinned mesh.
///
/// This is the geometry half of turning a skeleton and a portrait into a
/// textured character; [`crate::synthesize_texture`] pairs the result with a
/// material carrying the portrait.
pub fn assemble_mesh(skeleton: &Skeleton, config: &SynthesisConfig) -> SynthResult<SkinnedMesh> {
    let bounds = WorldBounds::from_config(config);
    let mut parts = assemble(skeleton)?;
    for part in &mut parts {
        project(part, &bounds);
    }
    let merged = merge(&parts)?;
    debug!(
        parts = parts.len(),
        vertices = merged.vertex_count(),
        "assembled primitive rig"
    );

    let mesh = SkinnedMesh::new(config.mesh_name.clone(), merged)?;
    mesh.validate(skeleton)?;
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton_builder::build;
    use pretty_assertions::assert_eq;
    use rigsmith_spec::{Bone, BoneTransform};

    #[test]
    fn test_part_table_layout() {
        let table = part_table();
        assert_eq!(table.len(), 26);
        assert_eq!(table[6].name, "left_shoulder");
        assert_eq!(table[16].name, "right_shoulder");
        assert_eq!(table[17].rotation.z, FRAC_PI_2);
        assert_eq!(table[20].offset.x, -0.04);
        assert_eq!(table[20].influences, vec![(CanonicalRole::RightHand, 1.0)]);
    }

    #[test]
    fn test_every_vertex_skinned_within_range() {
        let skeleton = build(1.75, 1.6).unwrap();
        let parts = assemble(&skeleton).unwrap();
        assert_eq!(parts.len(), 26);
        for part in &parts {
            assert!(!part.is_indexed());
            let weights = part.skin_weights.as_ref().unwrap();
            let joints = part.skin_indices.as_ref().unwrap();
            assert_eq!(weights.len(), part.vertex_count());
            for (w, j) in weights.iter().zip(joints) {
                assert!(w.iter().sum::<f32>() > 0.0);
                assert!(j.iter().all(|&bone| (bone as usize) < skeleton.bone_count()));
            }
        }
    }

    #[test]
    fn test_chest_blends_two_bones() {
        let skeleton = build(1.75, 1.6).unwrap();
        let parts = assemble(&skeleton).unwrap();
        let spine1 = skeleton.bone_index("Spine1").unwrap() as u16;
        let spine = skeleton.bone_index("Spine").unwrap() as u16;
        assert_eq!(parts[4].skin_indices.as_ref().unwrap()[0], [spine1, spine, 0, 0]);
        assert_eq!(parts[4].skin_weights.as_ref().unwrap()[0], [0.7, 0.3, 0.0, 0.0]);
    }

    #[test]
    fn test_parts_are_mirrored() {
        let skeleton = build(1.75, 1.6).unwrap();
        let parts = assemble(&skeleton).unwrap();
        for i in 6..16 {
            let left = parts[i].bounds().unwrap();
            let right = parts[i + 10].bounds().unwrap();
            assert!((left.center().x + right.center().x).abs() < 1e-4, "part {}", i);
            assert!((left.center().y - right.center().y).abs() < 1e-4);
            assert!(left.center().x > 0.0);
        }
    }

    #[test]
    fn test_upper_arm_spans_its_bone() {
        let skeleton = build(1.75, 1.6).unwrap();
        let parts = assemble(&skeleton).unwrap();
        let world = skeleton.world_positions();
        let arm = world[skeleton.bone_index("LeftArm").unwrap()];
        let forearm = world[skeleton.bone_index("LeftForeArm").unwrap()];
        let bounds = parts[7].bounds().unwrap();
        assert!((bounds.min.x - arm.x).abs() < 1e-4);
        assert!((bounds.max.x - forearm.x).abs() < 1e-4);
    }

    #[test]
    fn test_feet_rest_on_floor() {
        let skeleton = build(1.75, 1.6).unwrap();
        let parts = assemble(&skeleton).unwrap();
        let foot = parts[15].bounds().unwrap();
        assert!(foot.min.y.abs() < 2e-3);
    }

    #[test]
    fn test_missing_bone() {
        let skeleton = Skeleton::new(vec![Bone::new("Hips", None, BoneTransform::IDENTITY)
            .with_role(CanonicalRole::Hips)])
        .unwrap();
        let err = assemble(&skeleton).unwrap_err();
        assert!(matches!(
            err,
            SynthError::MissingBone {
                role: CanonicalRole::Head
            }
        ));
    }

    #[test]
    fn test_assemble_mesh_uvs_in_range() {
        let skeleton = build(1.75, 1.6).unwrap();
        let mesh = assemble_mesh(&skeleton, &SynthesisConfig::default()).unwrap();
        assert_eq!(mesh.name, "Humanoid_Mesh");
        for uv in mesh.uvs() {
            assert!(uv.iter().all(|&c| (0.001..=0.999).contains(&c)));
        }
    }
}
