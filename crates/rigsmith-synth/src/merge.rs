//! Concatenation of part geometries into one buffer set.

use rigsmith_spec::Geometry;

use crate::error::MergeError;

/// Concatenates `parts` in order.
///
/// Each part needs positions, normals and UVs. Parts without skin weights are
/// bound with full weight to influence slot 0, and parts without skin indices
/// to bone 0. When any part is indexed, the output is indexed: part indices
/// are offset by the part's first vertex and unindexed parts contribute
/// sequential indices.
pub fn merge(parts: &[Geometry]) -> Result<Geometry, MergeError> {
    let any_indexed = parts.iter().any(Geometry::is_indexed);
    let total: usize = parts.iter().map(Geometry::vertex_count).sum();

    let mut positions = Vec::with_capacity(total);
    let mut normals = Vec::with_capacity(total);
    let mut uvs = Vec::with_capacity(total);
    let mut skin_indices = Vec::with_capacity(total);
    let mut skin_weights = Vec::with_capacity(total);
    let mut indices = Vec::new();

    for (part, geometry) in parts.iter().enumerate() {
        let count = geometry.vertex_count();
        if count == 0 {
            return Err(MergeError::MissingAttribute {
                part,
                attribute: "position",
            });
        }
        let part_normals = required(part, "normal", geometry.normals.as_deref(), count)?;
        let part_uvs = required(part, "uv", geometry.uvs.as_deref(), count)?;
        let part_skin_indices = optional(part, "skin index", geometry.skin_indices.as_deref(), count)?;
        let part_skin_weights = optional(part, "skin weight", geometry.skin_weights.as_deref(), count)?;

        let base = positions.len() as u32;
        positions.extend_from_slice(&geometry.positions);
        normals.extend_from_slice(part_normals);
        uvs.extend_from_slice(part_uvs);
        match part_skin_indices {
            Some(values) => skin_indices.extend_from_slice(values),
            None => skin_indices.resize(skin_indices.len() + count, [0; 4]),
        }
        match part_skin_weights {
            Some(values) => skin_weights.extend_from_slice(values),
            None => skin_weights.resize(skin_weights.len() + count, [1.0, 0.0, 0.0, 0.0]),
        }

        if any_indexed {
            match &geometry.indices {
                Some(part_indices) => {
                    if let Some(&index) = part_indices.iter().find(|&&i| i as usize >= count) {
                        return Err(MergeError::LengthMismatch {
                            part,
                            attribute: "index",
                            expected: count,
                            actual: index as usize + 1,
                        });
                    }
                    indices.extend(part_indices.iter().map(|&i| base + i));
                }
                None => indices.extend(base..base + count as u32),
            }
        }
    }

    Ok(Geometry {
        positions,
        normals: Some(normals),
        uvs: Some(uvs),
        skin_indices: Some(skin_indices),
        skin_weights: Some(skin_weights),
        indices: any_indexed.then_some(indices),
    })
}

fn required<'a, T>(
    part: usize,
    attribute: &'static str,
    values: Option<&'a [T]>,
    expected: usize,
) -> Result<&'a [T], MergeError> {
    let values = values.ok_or(MergeError::MissingAttribute { part, attribute })?;
    check(part, attribute, values, expected)
}

fn optional<'a, T>(
    part: usize,
    attribute: &'static str,
    values: Option<&'a [T]>,
    expected: usize,
) -> Result<Option<&'a [T]>, MergeError> {
    values
        .map(|values| check(part, attribute, values, expected))
        .transpose()
}

fn check<'a, T>(
    part: usize,
    attribute: &'static str,
    values: &'a [T],
    expected: usize,
) -> Result<&'a [T], MergeError> {
    if values.len() != expected {
        return Err(MergeError::LengthMismatch {
            part,
            attribute,
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}
