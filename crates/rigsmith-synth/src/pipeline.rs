//! Portrait to rigged character.

use rigsmith_spec::{Material, Skeleton, SkinnedMesh, Texture};
use tracing::{debug, info};

use crate::assembler::assemble_mesh;
use crate::config::SynthesisConfig;
use crate::error::SynthResult;
use crate::portrait::{alpha_key, decode_portrait};
use crate::skeleton_builder::build;

/// A synthesized character: skeleton, skinned mesh and textured material.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub skeleton: Skeleton,
    pub mesh: SkinnedMesh,
    pub material: Material,
}

/// Decodes an encoded portrait and synthesizes a rigged character from it.
///
/// The portrait is decoded before any skeleton work, so a corrupt image fails
/// without producing a partial rig.
pub fn synthesize(portrait: &[u8], config: &SynthesisConfig) -> SynthResult<Character> {
    let texture = decode_portrait(portrait)?;
    synthesize_texture(texture, config)
}

/// Synthesizes a rigged character from an already decoded portrait.
pub fn synthesize_texture(mut texture: Texture, config: &SynthesisConfig) -> SynthResult<Character> {
    let keyed = alpha_key(&mut texture, config.alpha_threshold);
    debug!(
        width = texture.width(),
        height = texture.height(),
        keyed,
        "keyed portrait background"
    );

    let skeleton = build(config.height, config.arm_span)?;
    let mesh = assemble_mesh(&skeleton, config)?;
    let material = Material::new(config.material_name.clone(), Some(texture));

    info!(
        bones = skeleton.bone_count(),
        vertices = mesh.vertex_count(),
        "synthesized character"
    );

    Ok(Character {
        skeleton,
        mesh,
        material,
    })
}
