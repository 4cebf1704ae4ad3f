//! Property-based tests over classification, remapping and geometry.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rigsmith-tests --test proptest_properties
//! ```

use glam::Vec3;
use proptest::prelude::*;

use rigsmith_retarget::{retarget, RetargetOptions, RoleTable};
use rigsmith_spec::{AnimationClip, Geometry, Keyframes, Track, TrackProperty};
use rigsmith_synth::{cuboid, merge, project, sphere, WorldBounds};
use rigsmith_tests::{canonical_skeleton, rotation_track};

// ============================================================================
// 1. Classification
// ============================================================================

proptest! {
    /// Classification is a pure function of the name.
    #[test]
    fn classify_is_pure(name in "[A-Za-z0-9_: .]{0,40}") {
        let table = RoleTable::standard();
        prop_assert_eq!(table.classify(&name), table.classify(&name));
        prop_assert_eq!(table.classify(&name), RoleTable::standard().classify(&name));
    }

    /// Vendor prefixes never change the role of a canonical name.
    #[test]
    fn vendor_prefix_is_transparent(index in 0usize..20) {
        let role = rigsmith_spec::CanonicalRole::ALL[index];
        let table = RoleTable::standard();
        let options = RetargetOptions::default();
        let name = format!("mixamorig:{}", role.bone_name());
        prop_assert_eq!(table.classify(&options.strip_vendor_prefix(&name)), Some(role));
    }
}

// ============================================================================
// 2. Remapping
// ============================================================================

fn arbitrary_track() -> impl Strategy<Value = Track> {
    let names = prop::sample::select(vec![
        "mixamorig:Hips",
        "mixamorig:LeftArm",
        "Bip001 R Forearm",
        "spine_02",
        "Tail_01",
        "Jaw",
        "LeftFoot",
    ]);
    (names, 0u8..3, -200.0f32..200.0).prop_map(|(name, kind, value)| {
        let times = vec![0.0, 0.5];
        let keyframes = match kind {
            0 => Keyframes::Position(vec![Vec3::splat(value), Vec3::ZERO]),
            1 => Keyframes::Scale(vec![Vec3::ONE, Vec3::splat(value.abs() + 0.1)]),
            _ => Keyframes::Rotation(vec![
                glam::Quat::IDENTITY,
                glam::Quat::from_rotation_y(value.to_radians()),
            ]),
        };
        Track::new(name, times, keyframes).unwrap()
    })
}

proptest! {
    /// Matched output never carries scale, and positions only on the hips.
    #[test]
    fn no_scale_or_limb_translation(tracks in prop::collection::vec(arbitrary_track(), 1..12)) {
        let target = canonical_skeleton();
        let clip = AnimationClip::from_tracks("clip", tracks);
        let result = retarget(&clip, &target, 1.75, None, &RetargetOptions::default());
        prop_assume!(!result.report.fallback);

        for track in &result.clip.tracks {
            prop_assert!(target.bone_index(track.node()).is_some());
            prop_assert_ne!(track.property(), TrackProperty::Scale);
            if track.property() == TrackProperty::Position {
                prop_assert_eq!(track.node(), "Hips");
            }
        }
    }

    /// With no recognizable bone the clip comes back unchanged.
    #[test]
    fn fallback_clones_source(count in 1usize..6, angle in -3.0f32..3.0) {
        let tracks: Vec<Track> = (0..count)
            .map(|i| rotation_track(&format!("Tentacle_{i}"), angle))
            .collect();
        let clip = AnimationClip::from_tracks("squirm", tracks);
        let result = retarget(&clip, &canonical_skeleton(), 1.75, None, &RetargetOptions::default());

        prop_assert!(result.report.fallback);
        prop_assert_eq!(result.clip.track_names(), clip.track_names());
        prop_assert_eq!(&result.clip.tracks, &clip.tracks);
    }
}

// ============================================================================
// 3. Geometry
// ============================================================================

proptest! {
    /// Positions inside the framing project into the inset UV square.
    #[test]
    fn uvs_stay_in_range(
        points in prop::collection::vec((-0.72f32..0.72, 0.0f32..1.8375, -1.0f32..1.0), 1..50)
    ) {
        let mut geometry = Geometry {
            positions: points.iter().map(|&(x, y, z)| [x, y, z]).collect(),
            ..Default::default()
        };
        project(&mut geometry, &WorldBounds::for_character(1.75, 1.6));
        for uv in geometry.uvs.unwrap() {
            for c in uv {
                prop_assert!((0.001..=0.999).contains(&c), "uv component {}", c);
            }
        }
    }

    /// Merged vertex count is the sum of the parts, in order.
    #[test]
    fn merge_preserves_counts(
        boxes in 0usize..4,
        spheres in prop::collection::vec((3u32..10, 2u32..8), 0..4)
    ) {
        let mut parts: Vec<Geometry> = (0..boxes).map(|i| cuboid(1.0 + i as f32, 1.0, 1.0)).collect();
        parts.extend(spheres.iter().map(|&(w, h)| sphere(0.5, w, h)));
        prop_assume!(!parts.is_empty());

        let merged = merge(&parts).unwrap();
        let expected: usize = parts.iter().map(Geometry::vertex_count).sum();
        prop_assert_eq!(merged.vertex_count(), expected);

        let mut offset = 0;
        for part in &parts {
            prop_assert_eq!(&merged.positions[offset..offset + part.vertex_count()], &part.positions[..]);
            offset += part.vertex_count();
        }
    }
}
