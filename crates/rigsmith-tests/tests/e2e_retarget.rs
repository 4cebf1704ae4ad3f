//! Retargeting foreign rigs onto the canonical skeleton.

use glam::{Quat, Vec3};
use pretty_assertions::assert_eq;
use rigsmith_retarget::{retarget, RetargetOptions, Retargeter, RoleTable};
use rigsmith_spec::{AnimationClip, CanonicalRole, Keyframes, Pose, TrackProperty};
use rigsmith_tests::{biped_skeleton, canonical_skeleton, rotation_track, translation_track};

#[test]
fn biped_arm_lands_on_canonical_arm() {
    let clip = AnimationClip::from_tracks(
        "wave",
        vec![
            rotation_track("Bip001 L UpperArm", 0.8),
            translation_track("Bip001 L UpperArm", Vec3::ZERO, Vec3::X),
        ],
    );
    let target = canonical_skeleton();
    let result = retarget(&clip, &target, 1.75, None, &RetargetOptions::default());

    assert_eq!(result.clip.track_names(), vec!["LeftArm.quaternion".to_string()]);
    assert_eq!(result.report.dropped_position, 1);
    assert!(!result.report.fallback);

    let Keyframes::Rotation(keys) = result.clip.tracks[0].keyframes() else {
        panic!("expected rotation keys");
    };
    assert!(keys[1].abs_diff_eq(Quat::from_rotation_z(0.8), 1e-6));
}

#[test]
fn mixamo_clip_drives_every_role() {
    let target = canonical_skeleton();
    let tracks = CanonicalRole::ALL
        .iter()
        .map(|role| rotation_track(&format!("mixamorig:{}", role.bone_name()), 0.2))
        .collect();
    let clip = AnimationClip::from_tracks("mixamo.com", tracks);

    let result = Retargeter::default().retarget(&clip, &target, 1.75, None, "Dance");

    assert_eq!(result.clip.name, "Dance");
    assert_eq!(result.report.matched(), 20);
    for track in &result.clip.tracks {
        assert!(target.bone_index(track.node()).is_some(), "{}", track.node());
    }
    assert_eq!(
        result.clip.tracks_for("LeftForeArm").count(),
        1,
        "forearm and arm stay distinct"
    );
}

#[test]
fn centimeter_hips_are_rescaled_and_grounded() {
    let clip = AnimationClip::from_tracks(
        "walk",
        vec![translation_track(
            "Bip001 Pelvis",
            Vec3::new(10.0, 95.0, -4.0),
            Vec3::new(30.0, 97.0, 8.0),
        )],
    );
    let target = canonical_skeleton();
    let result = retarget(&clip, &target, 1.75, None, &RetargetOptions::default());

    assert_eq!(result.clip.tracks[0].node(), "Hips");
    let Keyframes::Position(keys) = result.clip.tracks[0].keyframes() else {
        panic!("expected position keys");
    };
    assert_eq!(keys[0].x, 0.0);
    assert_eq!(keys[0].z, 0.0);
    assert!((keys[0].y - 0.95).abs() < 1e-5);
    assert!((keys[1].y - 0.97).abs() < 1e-5);
    assert_eq!(result.report.rescaled_keys, 2);
}

#[test]
fn canonical_clip_onto_biped_rig() {
    let target = biped_skeleton();
    let clip = AnimationClip::from_tracks(
        "reach",
        vec![
            rotation_track("LeftArm", 0.5),
            rotation_track("LeftForeArm", 0.3),
            rotation_track("RightHand", 0.1),
        ],
    );
    let result = retarget(&clip, &target, 1.3, None, &RetargetOptions::default());

    assert_eq!(
        result.clip.track_names(),
        vec![
            "Bip001 L UpperArm.quaternion".to_string(),
            "Bip001 L Forearm.quaternion".to_string(),
        ]
    );
    assert_eq!(result.report.unmatched, vec!["RightHand".to_string()]);
}

#[test]
fn unmatched_clip_falls_back_to_source() {
    let clip = AnimationClip::from_tracks(
        "tail_wag",
        vec![rotation_track("Tail_01", 0.4), rotation_track("Tail_02", 0.2)],
    );
    let result = Retargeter::new(RoleTable::standard(), RetargetOptions::default()).retarget(
        &clip,
        &canonical_skeleton(),
        1.75,
        None,
        "Wag",
    );

    assert!(result.report.fallback);
    assert_eq!(result.clip.name, "Wag");
    assert_eq!(result.clip.tracks, clip.tracks);
}

#[test]
fn retargeted_pose_moves_only_driven_bones() {
    let target = canonical_skeleton();
    let clip = AnimationClip::from_tracks("lift", vec![rotation_track("mixamorig:LeftArm", 1.0)]);
    let result = retarget(&clip, &target, 1.75, None, &RetargetOptions::default());

    let rest = Pose::rest(&target);
    let posed = Pose::sample_clip(&target, &result.clip, 1.0);
    let arm = target.bone_by_role(CanonicalRole::LeftArm).unwrap();
    for (index, (a, b)) in rest.locals.iter().zip(&posed.locals).enumerate() {
        if index == arm {
            assert!(!a.rotation.abs_diff_eq(b.rotation, 1e-3));
        } else {
            assert_eq!(a, b);
        }
    }
    assert!(result
        .clip
        .tracks
        .iter()
        .all(|track| track.property() != TrackProperty::Scale));
}
