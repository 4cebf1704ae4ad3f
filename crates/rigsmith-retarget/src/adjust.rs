//! Pose corrections applied to a loaded character.

use glam::{Quat, Vec3};
use rigsmith_spec::{CanonicalRole, Pose, Skeleton};
use tracing::debug;

use crate::classifier::RoleTable;
use crate::config::ModelModifiers;

/// Upper arm rotation, in radians about local Z, that lifts an A-pose rest
/// into a T-pose.
pub const T_POSE_ARM_ROTATION: f32 = 0.87;

/// Rotates the upper arms about their local Z axis so an A-pose rest
/// reads as a T-pose. Returns the number of bones adjusted.
pub fn apply_t_pose_correction(pose: &mut Pose, skeleton: &Skeleton, table: &RoleTable) -> usize {
    let roles = table.assign(skeleton);
    let mut adjusted = 0;
    for (role, angle) in [
        (CanonicalRole::LeftArm, T_POSE_ARM_ROTATION),
        (CanonicalRole::RightArm, -T_POSE_ARM_ROTATION),
    ] {
        let Some(local) = roles.get(role).and_then(|index| pose.local_mut(index)) else {
            continue;
        };
        local.rotation = (local.rotation * Quat::from_rotation_z(angle)).normalize();
        adjusted += 1;
    }
    debug!(adjusted, "applied T-pose correction");
    adjusted
}

/// Applies body proportion multipliers to the bone scales of `pose`.
///
/// The whole character is scaled by `(width, height, width)`. The head scales
/// uniformly; arm, leg and spine bones scale across their length only.
pub fn apply_modifiers(
    pose: &mut Pose,
    skeleton: &Skeleton,
    table: &RoleTable,
    modifiers: &ModelModifiers,
) {
    pose.root_scale = Vec3::new(modifiers.width, modifiers.height, modifiers.width);

    for (index, bone) in skeleton.bones().iter().enumerate() {
        let Some(role) = table.classify(&bone.name) else {
            continue;
        };
        let across = if role == CanonicalRole::Head {
            Some(Vec3::splat(modifiers.head_size))
        } else if role.is_arm() {
            Some(thickness(modifiers.arm_thickness))
        } else if role.is_leg() {
            Some(thickness(modifiers.leg_thickness))
        } else if role.is_spine() {
            Some(thickness(modifiers.chest_size))
        } else {
            None
        };
        if let (Some(scale), Some(local)) = (across, pose.local_mut(index)) {
            local.scale = bone.rest.scale * scale;
        }
    }
}

fn thickness(amount: f32) -> Vec3 {
    Vec3::new(amount, 1.0, amount)
}
