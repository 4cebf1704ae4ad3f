//! Binary glTF container decoder.
//!
//! Reads characters and animation clips back out of GLB (or embedded-buffer
//! glTF) bytes using the `gltf` crate. Buffers must be embedded: either the
//! GLB binary chunk or base64 data URIs.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation as GltfInterpolation, Property};
use gltf::{Document, Gltf};
use rigsmith_spec::{
    AnimationClip, Bone, BoneTransform, Geometry, Interpolation, Keyframes, Material, Skeleton,
    SkinnedMesh, Texture, Track,
};
use tracing::{debug, warn};

use crate::data_uri::decode_data_uri;
use crate::error::{GlbError, GlbResult};

/// Name given to the bone joining a multi-root skin.
const SYNTHETIC_ROOT: &str = "SkinRoot";

/// Everything decoded from a character container.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterAsset {
    pub skeleton: Skeleton,
    /// First skinned primitive, when the container has one.
    pub mesh: Option<SkinnedMesh>,
    /// Material bound to `mesh`.
    pub material: Option<Material>,
    /// Every base-color texture referenced by a material.
    pub textures: Vec<Texture>,
    pub clips: Vec<AnimationClip>,
}

/// Clips decoded from an animation-only container.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSet {
    pub clips: Vec<AnimationClip>,
    /// Joint names of the source rig: the first skin's joints, or every named
    /// node when the container has no skin.
    pub joint_names: Vec<String>,
}

/// Parsed document plus resolved buffer contents.
struct Container {
    document: Document,
    buffers: Vec<Option<Vec<u8>>>,
}

impl Container {
    fn parse(bytes: &[u8]) -> GlbResult<Self> {
        let Gltf { document, blob } = Gltf::from_slice(bytes)?;
        let buffers = document
            .buffers()
            .map(|buffer| match buffer.source() {
                gltf::buffer::Source::Bin => blob.clone(),
                gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri) {
                    Ok((_, data)) => Some(data),
                    Err(err) => {
                        warn!(buffer = buffer.index(), error = %err, "external buffer not loaded");
                        None
                    }
                },
            })
            .collect();
        Ok(Self { document, buffers })
    }

    fn buffer(&self, buffer: gltf::Buffer<'_>) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).and_then(|b| b.as_deref())
    }

    fn view_bytes(&self, view: &gltf::buffer::View<'_>) -> Option<&[u8]> {
        let data = self.buffer(view.buffer())?;
        data.get(view.offset()..view.offset() + view.length())
    }
}

/// Decodes a character container.
pub fn decode(bytes: &[u8]) -> GlbResult<CharacterAsset> {
    let container = Container::parse(bytes)?;
    let skeleton_nodes = skeleton_nodes(&container.document);
    if skeleton_nodes.is_empty() {
        return Err(GlbError::NoSkeleton);
    }
    let skeleton = build_skeleton(&container.document, &skeleton_nodes)?;
    let textures = decode_textures(&container)?;
    let (mesh, material) = match first_skinned_primitive(&container.document) {
        Some((name, primitive)) => {
            let mesh = read_mesh(&container, name, &primitive)?;
            let material = read_material(&container, &primitive.material())?;
            (Some(mesh), Some(material))
        }
        None => (None, None),
    };
    let clips = read_clips(&container)?;

    debug!(
        bones = skeleton.bone_count(),
        vertices = mesh.as_ref().map_or(0, SkinnedMesh::vertex_count),
        textures = textures.len(),
        clips = clips.len(),
        "decoded character container"
    );

    Ok(CharacterAsset {
        skeleton,
        mesh,
        material,
        textures,
        clips,
    })
}

/// Decodes only the animations of a container, with the source joint names.
pub fn decode_clips(bytes: &[u8]) -> GlbResult<ClipSet> {
    let container = Container::parse(bytes)?;
    let joint_names = skeleton_nodes(&container.document)
        .into_iter()
        .filter_map(|index| {
            container
                .document
                .nodes()
                .nth(index)
                .map(|node| node_name(&node))
        })
        .collect();
    let clips = read_clips(&container)?;
    Ok(ClipSet { clips, joint_names })
}

/// Node indices forming the skeleton: the first skin's joints, or every named
/// node without a mesh.
fn skeleton_nodes(document: &Document) -> Vec<usize> {
    match document.skins().next() {
        Some(skin) => skin.joints().map(|node| node.index()).collect(),
        None => document
            .nodes()
            .filter(|node| node.name().is_some() && node.mesh().is_none())
            .map(|node| node.index())
            .collect(),
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn build_skeleton(document: &Document, joints: &[usize]) -> GlbResult<Skeleton> {
    let node_count = document.nodes().count();
    let mut node_parent = vec![None; node_count];
    for node in document.nodes() {
        for child in node.children() {
            node_parent[child.index()] = Some(node.index());
        }
    }

    let mut bone_of_node = vec![None; node_count];
    for (bone, &node) in joints.iter().enumerate() {
        bone_of_node[node] = Some(bone);
    }

    let nodes: Vec<gltf::Node<'_>> = document.nodes().collect();
    let bones = joints
        .iter()
        .map(|&index| {
            let node = &nodes[index];
            // Nearest ancestor that is itself a joint.
            let mut parent = None;
            let mut cursor = node_parent[index];
            let mut steps = 0;
            while let Some(ancestor) = cursor {
                if let Some(bone) = bone_of_node[ancestor] {
                    parent = Some(bone);
                    break;
                }
                steps += 1;
                if steps > node_count {
                    break;
                }
                cursor = node_parent[ancestor];
            }

            let (translation, rotation, scale) = node.transform().decomposed();
            let rest = BoneTransform::new(
                Vec3::from(translation),
                Quat::from_array(rotation),
                Vec3::from(scale),
            );
            Bone::new(node_name(node), parent, rest)
        })
        .collect::<Vec<_>>();

    Ok(Skeleton::new(join_roots(bones))?)
}

/// Parents every root to one appended synthetic bone when a skin has more
/// than one root, keeping joint indices stable.
fn join_roots(mut bones: Vec<Bone>) -> Vec<Bone> {
    let roots: Vec<usize> = bones
        .iter()
        .enumerate()
        .filter(|(_, bone)| bone.parent.is_none())
        .map(|(index, _)| index)
        .collect();
    if roots.len() < 2 {
        return bones;
    }

    let mut name = SYNTHETIC_ROOT.to_string();
    let mut suffix = 1;
    while bones.iter().any(|bone| bone.name == name) {
        name = format!("{SYNTHETIC_ROOT}_{suffix}");
        suffix += 1;
    }
    warn!(roots = roots.len(), root = %name, "skin has several roots, joining them");

    let synthetic = bones.len();
    for &root in &roots {
        bones[root].parent = Some(synthetic);
    }
    bones.push(Bone::new(name, None, BoneTransform::IDENTITY));
    bones
}

fn first_skinned_primitive(document: &Document) -> Option<(String, gltf::Primitive<'_>)> {
    document.meshes().find_map(|mesh| {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        mesh.primitives()
            .find(|primitive| primitive.get(&gltf::Semantic::Joints(0)).is_some())
            .map(|primitive| (name, primitive))
    })
}

fn read_mesh(
    container: &Container,
    name: String,
    primitive: &gltf::Primitive<'_>,
) -> GlbResult<SkinnedMesh> {
    let reader = primitive.reader(|buffer| container.buffer(buffer));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(GlbError::MissingBuffer("POSITION"))?
        .collect();
    let count = positions.len();
    let indices: Option<Vec<u32>> = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect());

    let normals = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => {
            warn!(mesh = %name, "mesh has no normals, computing them");
            vertex_normals(&positions, indices.as_deref())
        }
    };
    let uvs = match reader.read_tex_coords(0) {
        Some(coords) => coords.into_f32().collect(),
        None => {
            warn!(mesh = %name, "mesh has no texture coordinates");
            vec![[0.0, 0.0]; count]
        }
    };
    let skin_indices = reader
        .read_joints(0)
        .map(|joints| joints.into_u16().collect())
        .unwrap_or_else(|| vec![[0; 4]; count]);
    let mut skin_weights: Vec<[f32; 4]> = reader
        .read_weights(0)
        .map(|weights| weights.into_f32().collect())
        .unwrap_or_default();
    skin_weights.resize(count, [0.0; 4]);

    // Unweighted vertices follow the first influence.
    let mut unweighted = 0;
    for weights in &mut skin_weights {
        if !weights.iter().any(|&w| w > 0.0) {
            *weights = [1.0, 0.0, 0.0, 0.0];
            unweighted += 1;
        }
    }
    if unweighted > 0 {
        warn!(mesh = %name, vertices = unweighted, "bound unweighted vertices to their first joint");
    }

    let geometry = Geometry {
        positions,
        normals: Some(normals),
        uvs: Some(uvs),
        skin_indices: Some(skin_indices),
        skin_weights: Some(skin_weights),
        indices,
    };

    Ok(SkinnedMesh::new(name, geometry)?)
}

/// Area-weighted vertex normals; vertices outside any triangle point up.
fn vertex_normals(positions: &[[f32; 3]], indices: Option<&[u32]>) -> Vec<[f32; 3]> {
    let sequential: Vec<u32>;
    let indices = match indices {
        Some(indices) => indices,
        None => {
            sequential = (0..positions.len() as u32).collect();
            &sequential
        }
    };

    let mut sums = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(pa), Vec3::from(pb), Vec3::from(pc));
        let face = (pb - pa).cross(pc - pa);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    sums.into_iter()
        .map(|sum| sum.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

fn read_material(container: &Container, material: &gltf::Material<'_>) -> GlbResult<Material> {
    let pbr = material.pbr_metallic_roughness();
    let texture = match pbr.base_color_texture() {
        Some(info) => Some(decode_image(container, &info.texture().source())?),
        None => None,
    };

    let mut decoded = Material::new(material.name().unwrap_or("material"), texture);
    decoded.roughness = pbr.roughness_factor();
    decoded.metalness = pbr.metallic_factor();
    decoded.double_sided = material.double_sided();
    Ok(decoded)
}

fn decode_textures(container: &Container) -> GlbResult<Vec<Texture>> {
    let mut seen = HashSet::new();
    let mut textures = Vec::new();
    for material in container.document.materials() {
        let Some(info) = material.pbr_metallic_roughness().base_color_texture() else {
            continue;
        };
        let image = info.texture().source();
        if seen.insert(image.index()) {
            textures.push(decode_image(container, &image)?);
        }
    }
    Ok(textures)
}

fn decode_image(container: &Container, image: &gltf::Image<'_>) -> GlbResult<Texture> {
    let encoded = match image.source() {
        gltf::image::Source::View { view, .. } => container
            .view_bytes(&view)
            .ok_or(GlbError::MissingBuffer("image"))?
            .to_vec(),
        gltf::image::Source::Uri { uri, .. } => decode_data_uri(uri)?.1,
    };
    let rgba = image::load_from_memory(&encoded)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Texture::new(width, height, rgba.into_raw())?)
}

fn read_clips(container: &Container) -> GlbResult<Vec<AnimationClip>> {
    container
        .document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Animation_{}", animation.index()));
            let mut tracks = Vec::new();
            for channel in animation.channels() {
                if let Some(track) = read_track(container, &channel)? {
                    tracks.push(track);
                }
            }
            Ok(AnimationClip::from_tracks(name, tracks))
        })
        .collect()
}

fn read_track(
    container: &Container,
    channel: &gltf::animation::Channel<'_>,
) -> GlbResult<Option<Track>> {
    let target = channel.target();
    if matches!(target.property(), Property::MorphTargetWeights) {
        return Ok(None);
    }
    let node = node_name(&target.node());
    let reader = channel.reader(|buffer| container.buffer(buffer));

    let times: Vec<f32> = reader
        .read_inputs()
        .ok_or(GlbError::MissingBuffer("animation input"))?
        .collect();
    let outputs = reader
        .read_outputs()
        .ok_or(GlbError::MissingBuffer("animation output"))?;

    let interpolation = channel.sampler().interpolation();
    // Cubic spline outputs hold (in-tangent, value, out-tangent) triples.
    let (skip, step) = match interpolation {
        GltfInterpolation::CubicSpline => (1, 3),
        _ => (0, 1),
    };
    let keyframes = match outputs {
        ReadOutputs::Translations(iter) => {
            Keyframes::Position(iter.map(Vec3::from).skip(skip).step_by(step).collect())
        }
        ReadOutputs::Rotations(rotations) => {
            let rotations = rotations.into_f32().map(Quat::from_array);
            Keyframes::Rotation(rotations.skip(skip).step_by(step).collect())
        }
        ReadOutputs::Scales(iter) => {
            Keyframes::Scale(iter.map(Vec3::from).skip(skip).step_by(step).collect())
        }
        ReadOutputs::MorphTargetWeights(_) => return Ok(None),
    };

    let interpolation = match interpolation {
        GltfInterpolation::Step => Interpolation::Step,
        GltfInterpolation::Linear | GltfInterpolation::CubicSpline => Interpolation::Linear,
    };
    Ok(Some(
        Track::new(node, times, keyframes)?.with_interpolation(interpolation),
    ))
}
