//! Canonical humanoid skeleton from two measurements.

use glam::Vec3;
use rigsmith_spec::{Bone, BoneTransform, CanonicalRole, Skeleton};

use crate::error::{SynthError, SynthResult};

// Joint heights as fractions of the character height.
const HIPS_Y: f32 = 0.543;
const SPINE_Y: f32 = 0.657;
const CHEST_Y: f32 = 0.771;
const UPPER_CHEST_Y: f32 = 0.823;
const NECK_Y: f32 = 0.857;
const HEAD_Y: f32 = 0.943;
const SHOULDER_Y: f32 = 0.789;
const LEG_SEGMENT: f32 = 0.24;
const HIP_HALF_WIDTH: f32 = 0.057;

// Arm offsets as fractions of half the arm span.
const SHOULDER_X: f32 = 0.225;
const UPPER_ARM: f32 = 0.15;
const FOREARM: f32 = 0.35;
const HAND: f32 = 0.3125;

/// Builds the 20-bone canonical skeleton.
///
/// Bones are ordered Hips, Spine, Spine1, Spine2, Neck, Head, then the left
/// and right shoulder, arm, forearm, hand, upper leg, leg and foot. The
/// character faces +Z, so its left side is +X. Every bone carries its
/// canonical role and name, and the rest pose has no rotation.
pub fn build(height: f32, arm_span: f32) -> SynthResult<Skeleton> {
    for (name, value) in [("height", height), ("arm span", arm_span)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(SynthError::InvalidMeasurement { name, value });
        }
    }

    let half_span = arm_span * 0.5;
    let mut bones: Vec<Bone> = Vec::with_capacity(CanonicalRole::COUNT);
    let mut push = |role: CanonicalRole, parent: Option<usize>, offset: Vec3| -> usize {
        bones.push(
            Bone::new(role.bone_name(), parent, BoneTransform::from_translation(offset))
                .with_role(role),
        );
        bones.len() - 1
    };

    let up = |from: f32, to: f32| Vec3::new(0.0, (to - from) * height, 0.0);

    let hips = push(CanonicalRole::Hips, None, up(0.0, HIPS_Y));
    let spine = push(CanonicalRole::Spine, Some(hips), up(HIPS_Y, SPINE_Y));
    let chest = push(CanonicalRole::Spine1, Some(spine), up(SPINE_Y, CHEST_Y));
    let upper_chest = push(CanonicalRole::Spine2, Some(chest), up(CHEST_Y, UPPER_CHEST_Y));
    let neck = push(CanonicalRole::Neck, Some(upper_chest), up(UPPER_CHEST_Y, NECK_Y));
    push(CanonicalRole::Head, Some(neck), up(NECK_Y, HEAD_Y));

    for side in [Side::Left, Side::Right] {
        let s = side.sign();
        let [shoulder_role, arm_role, forearm_role, hand_role, up_leg_role, leg_role, foot_role] =
            side.roles();

        let shoulder = push(
            shoulder_role,
            Some(chest),
            Vec3::new(s * SHOULDER_X * half_span, (SHOULDER_Y - CHEST_Y) * height, 0.0),
        );
        let arm = push(arm_role, Some(shoulder), Vec3::new(s * UPPER_ARM * half_span, 0.0, 0.0));
        let forearm = push(forearm_role, Some(arm), Vec3::new(s * FOREARM * half_span, 0.0, 0.0));
        push(hand_role, Some(forearm), Vec3::new(s * HAND * half_span, 0.0, 0.0));

        let up_leg = push(up_leg_role, Some(hips), Vec3::new(s * HIP_HALF_WIDTH * height, 0.0, 0.0));
        let leg = push(leg_role, Some(up_leg), Vec3::new(0.0, -LEG_SEGMENT * height, 0.0));
        push(foot_role, Some(leg), Vec3::new(0.0, -LEG_SEGMENT * height, 0.0));
    }

    Ok(Skeleton::new(bones)?)
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    fn roles(self) -> [CanonicalRole; 7] {
        use CanonicalRole::*;
        match self {
            Side::Left => [LeftShoulder, LeftArm, LeftForeArm, LeftHand, LeftUpLeg, LeftLeg, LeftFoot],
            Side::Right => [
                RightShoulder,
                RightArm,
                RightForeArm,
                RightHand,
                RightUpLeg,
                RightLeg,
                RightFoot,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn world(skeleton: &Skeleton, role: CanonicalRole) -> Vec3 {
        let index = skeleton.bone_by_role(role).unwrap();
        skeleton.world_positions()[index]
    }

    #[test]
    fn test_twenty_bones_single_root() {
        let skeleton = build(1.75, 1.6).unwrap();
        assert_eq!(skeleton.bone_count(), 20);
        assert_eq!(skeleton.root_count(), 1);
        assert_eq!(skeleton.bones()[skeleton.root()].name, "Hips");
        for role in CanonicalRole::ALL {
            let index = skeleton.bone_by_role(role).unwrap();
            assert_eq!(skeleton.bones()[index].name, role.bone_name());
        }
    }

    #[test]
    fn test_bone_order() {
        let skeleton = build(1.75, 1.6).unwrap();
        let names: Vec<&str> = skeleton.bone_names().collect();
        assert_eq!(
            names,
            vec![
                "Hips", "Spine", "Spine1", "Spine2", "Neck", "Head", "LeftShoulder", "LeftArm",
                "LeftForeArm", "LeftHand", "LeftUpLeg", "LeftLeg", "LeftFoot", "RightShoulder",
                "RightArm", "RightForeArm", "RightHand", "RightUpLeg", "RightLeg", "RightFoot",
            ]
        );
    }

    #[test]
    fn test_default_proportions() {
        let skeleton = build(1.75, 1.6).unwrap();
        assert!((world(&skeleton, CanonicalRole::Hips).y - 0.95).abs() < 1e-3);
        assert!((world(&skeleton, CanonicalRole::Head).y - 1.65).abs() < 1e-3);
        let shoulder = world(&skeleton, CanonicalRole::LeftShoulder);
        assert!((shoulder.x - 0.18).abs() < 1e-4);
        assert!((shoulder.y - 1.38).abs() < 1e-3);
        let hand = world(&skeleton, CanonicalRole::RightHand);
        assert!((hand.x + 0.83).abs() < 1e-4);
        let foot = world(&skeleton, CanonicalRole::LeftFoot);
        assert!((foot.y - 0.11).abs() < 1e-3);
        assert!((foot.x - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(build(1.75, 1.6).unwrap(), build(1.75, 1.6).unwrap());
    }

    #[test]
    fn test_vertical_offsets_scale_with_height() {
        let base = build(1.75, 1.6).unwrap();
        let tall = build(2.0, 1.6).unwrap();
        let ratio = 2.0 / 1.75;
        for (a, b) in base.bones().iter().zip(tall.bones()) {
            assert!((b.rest.translation.y - a.rest.translation.y * ratio).abs() < 1e-5);
        }
        let head = CanonicalRole::Head;
        assert!(world(&tall, head).y > world(&base, head).y);
        assert!((world(&tall, CanonicalRole::LeftHand).x - world(&base, CanonicalRole::LeftHand).x).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_measurements() {
        assert!(matches!(
            build(0.0, 1.6),
            Err(SynthError::InvalidMeasurement { name: "height", .. })
        ));
        assert!(build(1.75, f32::NAN).is_err());
    }
}
