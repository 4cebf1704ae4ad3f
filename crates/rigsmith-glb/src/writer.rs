//! Binary glTF (GLB) container serializer.
//!
//! Bones become named nodes in skeleton order, followed by one mesh node that
//! carries the skin. All buffers share a single binary chunk; every buffer view
//! starts on a 4-byte boundary.

use glam::Mat4;
use rigsmith_spec::{AnimationClip, Interpolation, Keyframes, Material, Skeleton, SkinnedMesh};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::data_uri::PNG_MIME;
use crate::error::{GlbError, GlbResult};
use crate::png::encode_png;

const GENERATOR: &str = "rigsmith-glb";

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;
const FLOAT: u32 = 5126;

const LINEAR: u32 = 9729;
const CLAMP_TO_EDGE: u32 = 33071;

/// Accumulates the binary chunk with its buffer views and accessors.
#[derive(Default)]
struct BinBuilder {
    data: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinBuilder {
    fn push_view(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.data.len(),
            "byteLength": bytes.len(),
        });
        if let Some(target) = target {
            view["target"] = json!(target);
        }
        self.data.extend_from_slice(bytes);
        self.views.push(view);
        self.views.len() - 1
    }

    fn push_accessor(
        &mut self,
        bytes: &[u8],
        target: Option<u32>,
        component_type: u32,
        count: usize,
        kind: &str,
    ) -> usize {
        let view = self.push_view(bytes, target);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    fn set_bounds(&mut self, accessor: usize, min: Vec<f32>, max: Vec<f32>) {
        self.accessors[accessor]["min"] = json!(min);
        self.accessors[accessor]["max"] = json!(max);
    }

    fn push_vec3(&mut self, values: &[[f32; 3]], target: Option<u32>) -> usize {
        self.push_accessor(bytemuck::cast_slice(values), target, FLOAT, values.len(), "VEC3")
    }
}

/// Serializes a skinned character and its clips into GLB bytes.
///
/// Tracks whose node is not a bone of `skeleton` are skipped, and clips left
/// without tracks are omitted. The container is assembled in memory, so an
/// error never leaves partial output behind.
pub fn serialize(
    skeleton: &Skeleton,
    mesh: &SkinnedMesh,
    material: &Material,
    clips: &[AnimationClip],
) -> GlbResult<Vec<u8>> {
    mesh.validate(skeleton)?;

    let mut bin = BinBuilder::default();

    // Skeleton nodes, then the skinned mesh node.
    let mut nodes: Vec<Value> = skeleton
        .bones()
        .iter()
        .enumerate()
        .map(|(index, bone)| {
            let mut node = json!({
                "name": bone.name,
                "translation": bone.rest.translation.to_array(),
                "rotation": bone.rest.rotation.normalize().to_array(),
                "scale": bone.rest.scale.to_array(),
            });
            let children = skeleton.children(index);
            if !children.is_empty() {
                node["children"] = json!(children);
            }
            node
        })
        .collect();
    let mesh_node = nodes.len();
    nodes.push(json!({
        "name": mesh.name,
        "mesh": 0,
        "skin": 0,
    }));

    let inverse_binds: Vec<f32> = skeleton
        .inverse_bind_matrices()
        .iter()
        .flat_map(Mat4::to_cols_array)
        .collect();
    let ibm = bin.push_accessor(
        bytemuck::cast_slice(&inverse_binds),
        None,
        FLOAT,
        skeleton.bone_count(),
        "MAT4",
    );
    let skin = json!({
        "joints": (0..skeleton.bone_count()).collect::<Vec<_>>(),
        "inverseBindMatrices": ibm,
        "skeleton": skeleton.root(),
    });

    let primitive = write_primitive(&mut bin, mesh)?;
    let (materials, textures, images, samplers) = write_material(&mut bin, material)?;

    let mut animations = Vec::new();
    for clip in clips {
        if let Some(animation) = write_animation(&mut bin, skeleton, clip) {
            animations.push(animation);
        }
    }

    let mut root = json!({
        "asset": {
            "version": "2.0",
            "generator": GENERATOR,
        },
        "scene": 0,
        "scenes": [{ "nodes": [skeleton.root(), mesh_node] }],
        "nodes": nodes,
        "skins": [skin],
        "meshes": [{ "name": mesh.name, "primitives": [primitive] }],
        "materials": materials,
    });
    if !images.is_empty() {
        root["textures"] = json!(textures);
        root["images"] = json!(images);
        root["samplers"] = json!(samplers);
    }
    if !animations.is_empty() {
        root["animations"] = json!(animations);
    }

    while bin.data.len() % 4 != 0 {
        bin.data.push(0);
    }
    root["buffers"] = json!([{ "byteLength": bin.data.len() }]);
    root["bufferViews"] = json!(bin.views);
    root["accessors"] = json!(bin.accessors);

    let json_bytes = serde_json::to_vec(&root)?;
    let glb = assemble_glb(json_bytes, bin.data)?;
    info!(
        bones = skeleton.bone_count(),
        vertices = mesh.vertex_count(),
        clips = animations.len(),
        bytes = glb.len(),
        "serialized character container"
    );
    Ok(glb)
}

fn write_primitive(bin: &mut BinBuilder, mesh: &SkinnedMesh) -> GlbResult<Value> {
    let count = mesh.vertex_count();

    let position = bin.push_vec3(mesh.positions(), Some(ARRAY_BUFFER));
    let bounds = mesh.bounds().ok_or(GlbError::MissingBuffer("positions"))?;
    bin.set_bounds(position, bounds.min.to_array().to_vec(), bounds.max.to_array().to_vec());

    let normal = bin.push_vec3(mesh.normals(), Some(ARRAY_BUFFER));
    let uv = bin.push_accessor(
        bytemuck::cast_slice(mesh.uvs()),
        Some(ARRAY_BUFFER),
        FLOAT,
        count,
        "VEC2",
    );
    let joints = bin.push_accessor(
        bytemuck::cast_slice(mesh.skin_indices()),
        Some(ARRAY_BUFFER),
        UNSIGNED_SHORT,
        count,
        "VEC4",
    );

    let weights: Vec<[f32; 4]> = mesh.skin_weights().iter().map(normalize_weights).collect();
    let weights = bin.push_accessor(
        bytemuck::cast_slice(&weights),
        Some(ARRAY_BUFFER),
        FLOAT,
        count,
        "VEC4",
    );

    let mut primitive = json!({
        "attributes": {
            "POSITION": position,
            "NORMAL": normal,
            "TEXCOORD_0": uv,
            "JOINTS_0": joints,
            "WEIGHTS_0": weights,
        },
        "material": 0,
        "mode": 4,
    });

    if let Some(indices) = &mesh.geometry().indices {
        // u16 indices when every vertex fits
        let accessor = if count <= u16::MAX as usize {
            let short: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            bin.push_accessor(
                bytemuck::cast_slice(&short),
                Some(ELEMENT_ARRAY_BUFFER),
                UNSIGNED_SHORT,
                short.len(),
                "SCALAR",
            )
        } else {
            bin.push_accessor(
                bytemuck::cast_slice(indices),
                Some(ELEMENT_ARRAY_BUFFER),
                UNSIGNED_INT,
                indices.len(),
                "SCALAR",
            )
        };
        primitive["indices"] = json!(accessor);
    }

    Ok(primitive)
}

fn normalize_weights(weights: &[f32; 4]) -> [f32; 4] {
    let clamped = weights.map(|w| w.max(0.0));
    let sum: f32 = clamped.iter().sum();
    if sum > 0.0 {
        clamped.map(|w| w / sum)
    } else {
        [1.0, 0.0, 0.0, 0.0]
    }
}

type MaterialSection = (Vec<Value>, Vec<Value>, Vec<Value>, Vec<Value>);

fn write_material(bin: &mut BinBuilder, material: &Material) -> GlbResult<MaterialSection> {
    let mut pbr = json!({
        "metallicFactor": material.metalness,
        "roughnessFactor": material.roughness,
    });
    let mut textures = Vec::new();
    let mut images = Vec::new();
    let mut samplers = Vec::new();

    if let Some(texture) = material.base_color() {
        let png = encode_png(texture)?;
        let view = bin.push_view(&png, None);
        debug!(
            width = texture.width(),
            height = texture.height(),
            bytes = png.len(),
            "embedded base color texture"
        );
        images.push(json!({ "bufferView": view, "mimeType": PNG_MIME }));
        samplers.push(json!({
            "magFilter": LINEAR,
            "minFilter": LINEAR,
            "wrapS": CLAMP_TO_EDGE,
            "wrapT": CLAMP_TO_EDGE,
        }));
        textures.push(json!({ "source": 0, "sampler": 0 }));
        pbr["baseColorTexture"] = json!({ "index": 0 });
    }

    let materials = vec![json!({
        "name": material.name,
        "pbrMetallicRoughness": pbr,
        "doubleSided": material.double_sided,
    })];
    Ok((materials, textures, images, samplers))
}

fn write_animation(bin: &mut BinBuilder, skeleton: &Skeleton, clip: &AnimationClip) -> Option<Value> {
    let mut channels = Vec::new();
    let mut samplers = Vec::new();

    for track in &clip.tracks {
        let Some(node) = skeleton.bone_index(track.node()) else {
            debug!(clip = %clip.name, target = %track.target(), "skipping track for unknown node");
            continue;
        };
        if track.is_empty() {
            continue;
        }

        let times = track.times();
        let input = bin.push_accessor(bytemuck::cast_slice(times), None, FLOAT, times.len(), "SCALAR");
        let (first, last) = (times[0], times[times.len() - 1]);
        bin.set_bounds(input, vec![first], vec![last]);

        let (output, path) = match track.keyframes() {
            Keyframes::Position(values) => {
                let values: Vec<[f32; 3]> = values.iter().map(|v| v.to_array()).collect();
                (bin.push_vec3(&values, None), "translation")
            }
            Keyframes::Rotation(values) => {
                let values: Vec<[f32; 4]> = values.iter().map(|q| q.to_array()).collect();
                let accessor = bin.push_accessor(
                    bytemuck::cast_slice(&values),
                    None,
                    FLOAT,
                    values.len(),
                    "VEC4",
                );
                (accessor, "rotation")
            }
            Keyframes::Scale(values) => {
                let values: Vec<[f32; 3]> = values.iter().map(|v| v.to_array()).collect();
                (bin.push_vec3(&values, None), "scale")
            }
        };

        let interpolation = match track.interpolation() {
            Interpolation::Linear => "LINEAR",
            Interpolation::Step => "STEP",
        };
        samplers.push(json!({
            "input": input,
            "output": output,
            "interpolation": interpolation,
        }));
        channels.push(json!({
            "sampler": samplers.len() - 1,
            "target": { "node": node, "path": path },
        }));
    }

    if channels.is_empty() {
        debug!(clip = %clip.name, "omitting clip without bone tracks");
        return None;
    }
    Some(json!({
        "name": clip.name,
        "channels": channels,
        "samplers": samplers,
    }))
}

/// Wraps a JSON document and a binary blob in the GLB container layout.
pub(crate) fn assemble_glb(mut json_bytes: Vec<u8>, mut bin: Vec<u8>) -> GlbResult<Vec<u8>> {
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let mut total = 12 + 8 + json_bytes.len();
    if !bin.is_empty() {
        total += 8 + bin.len();
    }
    let total_len = u32::try_from(total).map_err(|_| GlbError::TooLarge(total))?;

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&total_len.to_le_bytes());

    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    if !bin.is_empty() {
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(&bin);
    }

    Ok(glb)
}
