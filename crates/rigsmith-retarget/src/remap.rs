//! Track remapping against a target skeleton.

use std::collections::{HashMap, HashSet};

use glam::Quat;
use rigsmith_spec::{AnimationClip, CanonicalRole, Keyframes, Skeleton, Track, TrackProperty};
use tracing::{debug, info, warn};

use crate::classifier::RoleTable;
use crate::config::{strip_vendor, RetargetOptions};
use crate::root_motion::RootMotionNormalizer;

/// What happened to the tracks of one retarget call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetargetReport {
    /// Tracks redirected through a classified role.
    pub matched_by_role: usize,
    /// Tracks redirected through a case-insensitive exact name match.
    pub matched_by_name: usize,
    pub dropped_scale: usize,
    /// Translation tracks dropped because their bone is not the hips.
    pub dropped_position: usize,
    /// Tracks dropped because an earlier track already drives the same
    /// bone property.
    pub dropped_duplicate: usize,
    /// Source nodes that matched no target bone, in first-seen order.
    pub unmatched: Vec<String>,
    /// Hip translation keys whose vertical component was unit-rescaled.
    pub rescaled_keys: usize,
    /// No track matched and the source tracks were returned unchanged.
    pub fallback: bool,
}

impl RetargetReport {
    pub fn matched(&self) -> usize {
        self.matched_by_role + self.matched_by_name
    }
}

/// A retargeted clip and its report.
#[derive(Debug, Clone, PartialEq)]
pub struct Retargeted {
    pub clip: AnimationClip,
    pub report: RetargetReport,
}

/// Rewrites clips for target skeletons using one classifier table.
#[derive(Debug, Clone, Default)]
pub struct Retargeter {
    table: RoleTable,
    options: RetargetOptions,
}

impl Retargeter {
    pub fn new(table: RoleTable, options: RetargetOptions) -> Self {
        Self { table, options }
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn options(&self) -> &RetargetOptions {
        &self.options
    }

    /// Rewrites `source` so its tracks drive bones of `target`.
    ///
    /// Scale tracks are always dropped, and translation tracks survive only on
    /// the hip bone, whose keys go through [`RootMotionNormalizer`]. When no
    /// track matches, the result holds the unchanged source tracks and
    /// `report.fallback` is set. The output clip is named `name`.
    pub fn retarget(
        &self,
        source: &AnimationClip,
        target: &Skeleton,
        target_height: f32,
        hips_bind_rotation: Option<Quat>,
        name: &str,
    ) -> Retargeted {
        let role_map = self.table.assign(target);

        let mut by_lower_name: HashMap<String, usize> = HashMap::new();
        for (index, bone) in target.bones().iter().enumerate() {
            by_lower_name.entry(bone.name.to_lowercase()).or_insert(index);
        }

        let normalizer = RootMotionNormalizer::new(
            hips_bind_rotation,
            target_height,
            self.options.root_motion.clone(),
        );

        let mut report = RetargetReport::default();
        let mut driven: HashSet<(usize, TrackProperty)> = HashSet::new();
        let mut tracks = Vec::with_capacity(source.tracks.len());

        let vendor = self.options.vendor_pattern();
        for track in &source.tracks {
            let cleaned = strip_vendor(vendor.as_ref(), track.node());
            let cleaned = cleaned.as_ref();
            let property = track.property();

            if property == TrackProperty::Scale {
                report.dropped_scale += 1;
                continue;
            }

            let role = self.table.classify(cleaned);
            let (bone_index, by_role) = match role.and_then(|role| role_map.get(role)) {
                Some(index) => (index, true),
                None => match by_lower_name.get(&cleaned.to_lowercase()) {
                    Some(&index) => (index, false),
                    None => {
                        if !report.unmatched.iter().any(|n| n == track.node()) {
                            report.unmatched.push(track.node().to_string());
                        }
                        continue;
                    }
                },
            };

            let bone_name = &target.bones()[bone_index].name;
            let is_hips = role == Some(CanonicalRole::Hips)
                || self.table.classify(bone_name) == Some(CanonicalRole::Hips);

            if property == TrackProperty::Position && !is_hips {
                report.dropped_position += 1;
                continue;
            }

            if !driven.insert((bone_index, property)) {
                debug!(node = track.node(), bone = %bone_name, "duplicate track dropped");
                report.dropped_duplicate += 1;
                continue;
            }

            let mut remapped = track.renamed(bone_name.clone());
            if is_hips {
                remapped = self.normalize_hips(&remapped, &normalizer, &mut report);
            }

            if by_role {
                report.matched_by_role += 1;
            } else {
                report.matched_by_name += 1;
            }
            tracks.push(remapped);
        }

        if tracks.is_empty() {
            warn!(
                clip = %source.name,
                tracks = source.tracks.len(),
                "no tracks matched the target skeleton, using the clip unretargeted"
            );
            report.fallback = true;
            let clip = AnimationClip::new(name, source.duration, source.tracks.clone());
            return Retargeted { clip, report };
        }

        info!(
            clip = %source.name,
            matched = report.matched(),
            by_role = report.matched_by_role,
            by_name = report.matched_by_name,
            unmatched = report.unmatched.len(),
            dropped_scale = report.dropped_scale,
            dropped_position = report.dropped_position,
            "retargeted clip"
        );

        Retargeted {
            clip: AnimationClip::new(name, source.duration, tracks),
            report,
        }
    }

    fn normalize_hips(
        &self,
        track: &Track,
        normalizer: &RootMotionNormalizer,
        report: &mut RetargetReport,
    ) -> Track {
        let keyframes = match track.keyframes() {
            Keyframes::Rotation(keys) => {
                let mut keys = keys.clone();
                normalizer.normalize_rotation(&mut keys);
                Keyframes::Rotation(keys)
            }
            Keyframes::Position(keys) => {
                let mut keys = keys.clone();
                report.rescaled_keys += normalizer.normalize_translation(&mut keys);
                Keyframes::Position(keys)
            }
            Keyframes::Scale(_) => return track.clone(),
        };
        // Same key count and times as the source track, so this cannot fail.
        track.with_keyframes(keyframes).unwrap_or_else(|_| track.clone())
    }
}

/// Retargets with the standard role table. The output keeps the source
/// clip's name.
pub fn retarget(
    source: &AnimationClip,
    target: &Skeleton,
    target_height: f32,
    hips_bind_rotation: Option<Quat>,
    options: &RetargetOptions,
) -> Retargeted {
    Retargeter::new(RoleTable::standard(), options.clone()).retarget(
        source,
        target,
        target_height,
        hips_bind_rotation,
        &source.name,
    )
}

/// Clip name for an animation asset: the file name without its last
/// extension, or `Anim_<id>` when that leaves nothing.
pub fn clip_name_from_asset(asset_name: &str, id: u64) -> String {
    let stem = match asset_name.rfind('.') {
        Some(dot) if !asset_name[dot + 1..].is_empty() && !asset_name[dot + 1..].contains('/') => {
            &asset_name[..dot]
        }
        _ => asset_name,
    };
    if stem.is_empty() {
        format!("Anim_{id}")
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pretty_assertions::assert_eq;
    use rigsmith_spec::{Bone, BoneTransform};

    fn target() -> Skeleton {
        Skeleton::new(vec![
            Bone::new("Hips", None, BoneTransform::from_translation(Vec3::new(0.0, 0.95, 0.0))),
            Bone::new("Spine", Some(0), BoneTransform::IDENTITY),
            Bone::new("LeftArm", Some(1), BoneTransform::IDENTITY),
            Bone::new("Tail", Some(0), BoneTransform::IDENTITY),
        ])
        .unwrap()
    }

    fn rotation(node: &str) -> Track {
        Track::new(
            node,
            vec![0.0, 1.0],
            Keyframes::Rotation(vec![Quat::IDENTITY, Quat::from_rotation_z(0.4)]),
        )
        .unwrap()
    }

    fn position(node: &str, y: f32) -> Track {
        Track::new(
            node,
            vec![0.0, 1.0],
            Keyframes::Position(vec![Vec3::new(5.0, y, 3.0), Vec3::new(6.0, y, 4.0)]),
        )
        .unwrap()
    }

    fn scale(node: &str) -> Track {
        Track::new(node, vec![0.0], Keyframes::Scale(vec![Vec3::ONE])).unwrap()
    }

    #[test]
    fn test_remaps_by_role_and_drops_limb_positions() {
        let clip = AnimationClip::from_tracks(
            "wave",
            vec![
                rotation("Bip001 L UpperArm"),
                position("Bip001 L UpperArm", 1.0),
                scale("Bip001 L UpperArm"),
            ],
        );
        let result = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());

        assert_eq!(result.clip.track_names(), vec!["LeftArm.quaternion"]);
        assert_eq!(result.report.matched_by_role, 1);
        assert_eq!(result.report.dropped_position, 1);
        assert_eq!(result.report.dropped_scale, 1);
        assert!(!result.report.fallback);
        assert_eq!(result.clip.name, "wave");
    }

    #[test]
    fn test_vendor_prefix_and_name_fallback() {
        let clip = AnimationClip::from_tracks(
            "idle",
            vec![rotation("mixamorig:Spine"), rotation("mixamorig7:tail")],
        );
        let result = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());

        assert_eq!(result.clip.track_names(), vec!["Spine.quaternion", "Tail.quaternion"]);
        assert_eq!(result.report.matched_by_role, 1);
        assert_eq!(result.report.matched_by_name, 1);
    }

    #[test]
    fn test_hip_position_pinned_and_rescaled() {
        let clip = AnimationClip::from_tracks("walk", vec![position("mixamorig:Hips", 98.0)]);
        let result = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());

        let Keyframes::Position(keys) = result.clip.tracks[0].keyframes() else {
            panic!("expected position keys");
        };
        for key in keys {
            assert_eq!(key.x, 0.0);
            assert_eq!(key.z, 0.0);
            assert!((key.y - 0.98).abs() < 1e-5);
        }
        assert_eq!(result.report.rescaled_keys, 2);
    }

    #[test]
    fn test_hip_rotation_anchored_to_bind() {
        let bind = Quat::from_rotation_x(0.5);
        let start = Quat::from_rotation_y(1.0);
        let clip = AnimationClip::from_tracks(
            "turn",
            vec![Track::new(
                "Hips",
                vec![0.0, 1.0],
                Keyframes::Rotation(vec![start, start * Quat::from_rotation_z(0.25)]),
            )
            .unwrap()],
        );
        let result = retarget(&clip, &target(), 1.75, Some(bind), &RetargetOptions::default());

        let Keyframes::Rotation(keys) = result.clip.tracks[0].keyframes() else {
            panic!("expected rotation keys");
        };
        assert!(keys[0].abs_diff_eq(bind, 1e-5));
        assert!(keys[1].abs_diff_eq(bind * Quat::from_rotation_z(0.25), 1e-5));
    }

    #[test]
    fn test_zero_matches_falls_back_to_clone() {
        let clip = AnimationClip::from_tracks(
            "dance",
            vec![rotation("Wing_01"), position("Wing_02", 2.0), scale("Wing_01")],
        );
        let result = Retargeter::default().retarget(&clip, &target(), 1.75, None, "Anim_3");

        assert!(result.report.fallback);
        assert_eq!(result.clip.name, "Anim_3");
        assert_eq!(result.clip.tracks, clip.tracks);
        assert_eq!(result.report.unmatched, vec!["Wing_01", "Wing_02"]);
    }

    #[test]
    fn test_duplicate_targets_keep_first() {
        let clip = AnimationClip::from_tracks(
            "dup",
            vec![rotation("mixamorig:Spine"), rotation("spine_01")],
        );
        let result = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());
        assert_eq!(result.clip.tracks.len(), 1);
        assert_eq!(result.report.dropped_duplicate, 1);
    }

    #[test]
    fn test_input_clip_unchanged_and_repeatable() {
        let clip = AnimationClip::from_tracks("walk", vec![position("Hips", 98.0)]);
        let before = clip.clone();
        let first = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());
        let second = retarget(&clip, &target(), 1.75, None, &RetargetOptions::default());
        assert_eq!(clip, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_clip_name_from_asset() {
        assert_eq!(clip_name_from_asset("Samba Dancing.fbx", 1), "Samba Dancing");
        assert_eq!(clip_name_from_asset("walk.cycle.glb", 1), "walk.cycle");
        assert_eq!(clip_name_from_asset("idle", 1), "idle");
        assert_eq!(clip_name_from_asset("", 7), "Anim_7");
        assert_eq!(clip_name_from_asset(".glb", 9), "Anim_9");
    }
}
