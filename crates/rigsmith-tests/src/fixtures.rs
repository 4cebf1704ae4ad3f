//! Synthetic rigs, clips and portraits for integration tests.

use glam::{Quat, Vec3};
use rigsmith_spec::{Bone, BoneTransform, Keyframes, Skeleton, Texture, Track};

/// Encoded PNG portrait: a light background with a darker figure in the
/// middle third.
pub fn portrait_png(width: u32, height: u32) -> Vec<u8> {
    let mut texture = Texture::solid(width, height, [250, 250, 250, 255]);
    let (x0, x1) = (width / 3, width * 2 / 3);
    let pixels = texture.pixels_mut();
    for y in 0..height {
        for x in x0..x1 {
            let offset = ((y * width + x) * 4) as usize;
            pixels[offset..offset + 4].copy_from_slice(&[140, 90, 70, 255]);
        }
    }
    rigsmith_glb::encode_png(&texture).expect("encode portrait")
}

/// The canonical 20-bone rig at the default proportions.
pub fn canonical_skeleton() -> Skeleton {
    rigsmith_synth::build(1.75, 1.6).expect("canonical skeleton")
}

/// The canonical rig with every bone renamed to `prefix + name`.
pub fn prefixed_skeleton(prefix: &str) -> Skeleton {
    let bones = canonical_skeleton()
        .bones()
        .iter()
        .map(|bone| Bone {
            name: format!("{prefix}{}", bone.name),
            role: None,
            ..bone.clone()
        })
        .collect();
    Skeleton::new(bones).expect("prefixed skeleton")
}

/// A small 3ds Max style biped: pelvis, spine and a left arm chain.
pub fn biped_skeleton() -> Skeleton {
    let bone = |name: &str, parent: Option<usize>, offset: Vec3| {
        Bone::new(name, parent, BoneTransform::from_translation(offset))
    };
    Skeleton::new(vec![
        bone("Bip001 Pelvis", None, Vec3::new(0.0, 95.0, 0.0)),
        bone("Bip001 Spine", Some(0), Vec3::new(0.0, 10.0, 0.0)),
        bone("Bip001 L Clavicle", Some(1), Vec3::new(5.0, 35.0, 0.0)),
        bone("Bip001 L UpperArm", Some(2), Vec3::new(15.0, 0.0, 0.0)),
        bone("Bip001 L Forearm", Some(3), Vec3::new(28.0, 0.0, 0.0)),
    ])
    .expect("biped skeleton")
}

/// Two-key rotation track from identity to a turn about Z.
pub fn rotation_track(node: &str, angle: f32) -> Track {
    Track::new(
        node,
        vec![0.0, 1.0],
        Keyframes::Rotation(vec![Quat::IDENTITY, Quat::from_rotation_z(angle)]),
    )
    .expect("rotation track")
}

/// Two-key translation track.
pub fn translation_track(node: &str, from: Vec3, to: Vec3) -> Track {
    Track::new(node, vec![0.0, 1.0], Keyframes::Position(vec![from, to]))
        .expect("translation track")
}
