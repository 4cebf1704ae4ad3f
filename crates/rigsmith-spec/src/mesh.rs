//! Vertex attribute buffers and skinned meshes.

use glam::{Mat3, Mat4, Vec3};

use crate::error::{SpecError, SpecResult};
use crate::skeleton::Skeleton;

/// Maximum bone influences per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Bounding box of a point set, `None` when empty.
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = Vec3::from(*first);
        let mut max = min;
        for point in rest {
            let p = Vec3::from(*point);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }
}

/// Per-vertex attribute buffers. Only positions are mandatory; optional
/// attributes, when present, hold exactly one entry per vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub skin_indices: Option<Vec<[u16; 4]>>,
    pub skin_weights: Option<Vec<[f32; 4]>>,
    /// Triangle list indices. `None` means every three vertices form a
    /// triangle.
    pub indices: Option<Vec<u32>>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Expands an indexed geometry so every triangle corner owns its vertex.
    /// Non-indexed geometry is returned unchanged.
    pub fn to_non_indexed(&self) -> Geometry {
        let Some(indices) = &self.indices else {
            return self.clone();
        };

        fn gather<T: Copy>(values: &[T], indices: &[u32]) -> Vec<T> {
            indices.iter().map(|&i| values[i as usize]).collect()
        }

        Geometry {
            positions: gather(&self.positions, indices),
            normals: self.normals.as_deref().map(|v| gather(v, indices)),
            uvs: self.uvs.as_deref().map(|v| gather(v, indices)),
            skin_indices: self.skin_indices.as_deref().map(|v| gather(v, indices)),
            skin_weights: self.skin_weights.as_deref().map(|v| gather(v, indices)),
            indices: None,
        }
    }

    /// Transforms positions by `matrix` and normals by its normal matrix.
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        for position in &mut self.positions {
            *position = matrix.transform_point3(Vec3::from(*position)).to_array();
        }
        if let Some(normals) = &mut self.normals {
            let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
            for normal in normals.iter_mut() {
                *normal = (normal_matrix * Vec3::from(*normal))
                    .normalize_or_zero()
                    .to_array();
            }
        }
    }

    /// Binds every vertex to the same influences.
    pub fn set_uniform_skin(&mut self, indices: [u16; 4], weights: [f32; 4]) {
        let count = self.vertex_count();
        self.skin_indices = Some(vec![indices; count]);
        self.skin_weights = Some(vec![weights; count]);
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.positions)
    }

    /// Checks that every optional attribute matches the vertex count and that
    /// triangle indices are in range.
    pub fn validate_layout(&self) -> SpecResult<()> {
        let expected = self.vertex_count();
        check_len("normal", expected, self.normals.as_ref().map(Vec::len))?;
        check_len("uv", expected, self.uvs.as_ref().map(Vec::len))?;
        check_len("skin index", expected, self.skin_indices.as_ref().map(Vec::len))?;
        check_len("skin weight", expected, self.skin_weights.as_ref().map(Vec::len))?;
        if let Some(indices) = &self.indices {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= expected) {
                return Err(SpecError::IndexOutOfRange {
                    index,
                    vertex_count: expected,
                });
            }
        }
        Ok(())
    }
}

fn check_len(attribute: &'static str, expected: usize, actual: Option<usize>) -> SpecResult<()> {
    match actual {
        Some(actual) if actual != expected => Err(SpecError::AttributeLength {
            attribute,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// A geometry carrying every attribute needed for skinning and texturing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedMesh {
    pub name: String,
    geometry: Geometry,
}

impl SkinnedMesh {
    /// Wraps a geometry, requiring normals, UVs, skin indices and weights,
    /// and at least one positive weight per vertex.
    pub fn new(name: impl Into<String>, geometry: Geometry) -> SpecResult<Self> {
        geometry.validate_layout()?;
        if geometry.normals.is_none() {
            return Err(SpecError::MissingAttribute("normal"));
        }
        if geometry.uvs.is_none() {
            return Err(SpecError::MissingAttribute("uv"));
        }
        if geometry.skin_indices.is_none() {
            return Err(SpecError::MissingAttribute("skin index"));
        }
        let Some(weights) = &geometry.skin_weights else {
            return Err(SpecError::MissingAttribute("skin weight"));
        };
        if let Some(vertex) = weights
            .iter()
            .position(|w| !w.iter().any(|&weight| weight > 0.0))
        {
            return Err(SpecError::UnweightedVertex { vertex });
        }

        Ok(Self {
            name: name.into(),
            geometry,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.geometry.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        self.geometry.normals.as_deref().unwrap_or_default()
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        self.geometry.uvs.as_deref().unwrap_or_default()
    }

    pub fn skin_indices(&self) -> &[[u16; 4]] {
        self.geometry.skin_indices.as_deref().unwrap_or_default()
    }

    pub fn skin_weights(&self) -> &[[f32; 4]] {
        self.geometry.skin_weights.as_deref().unwrap_or_default()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry.bounds()
    }

    /// Checks that every influence with a nonzero weight references a bone of
    /// `skeleton`.
    pub fn validate(&self, skeleton: &Skeleton) -> SpecResult<()> {
        let bone_count = skeleton.bone_count();
        for (vertex, (indices, weights)) in self
            .skin_indices()
            .iter()
            .zip(self.skin_weights())
            .enumerate()
        {
            for (&bone, &weight) in indices.iter().zip(weights) {
                if weight != 0.0 && bone as usize >= bone_count {
                    return Err(SpecError::BoneIndexOutOfRange {
                        vertex,
                        bone,
                        bone_count,
                    });
                }
            }
        }
        Ok(())
    }
}
