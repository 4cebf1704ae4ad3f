//! Indexed primitive solids with normals and UVs.
//!
//! Every primitive is centered on the origin; cylinders run along Y.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rigsmith_spec::Geometry;
use serde::{Deserialize, Serialize};

/// A primitive solid and its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
}

impl Primitive {
    pub fn build(&self) -> Geometry {
        match *self {
            Primitive::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Primitive::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => cylinder(radius_top, radius_bottom, height, radial_segments),
            Primitive::Cuboid {
                width,
                height,
                depth,
            } => cuboid(width, height, depth),
        }
    }
}

#[derive(Default)]
struct Builder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Builder {
    fn vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push(uv);
        (self.positions.len() - 1) as u32
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn finish(self) -> Geometry {
        Geometry {
            positions: self.positions,
            normals: Some(self.normals),
            uvs: Some(self.uvs),
            indices: Some(self.indices),
            ..Default::default()
        }
    }
}

/// UV sphere. Segment counts are raised to at least 3 and 2.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut builder = Builder::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            let normal = Vec3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            builder.vertex(normal * radius, normal, [u, 1.0 - v]);
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // Pole rows collapse to a point, so they get one triangle each.
            if iy != 0 {
                builder.triangle(a, b, d);
            }
            if iy != height_segments - 1 {
                builder.triangle(b, c, d);
            }
        }
    }

    builder.finish()
}

/// Capped, possibly tapered cylinder along Y, centered on the origin.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Geometry {
    let radial_segments = radial_segments.max(3);
    let half = height * 0.5;
    let slope = if height != 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };
    let mut builder = Builder::default();

    for (v, radius) in [(0.0, radius_top), (1.0, radius_bottom)] {
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let y = half - v * height;
            let normal = Vec3::new(sin, slope, cos).normalize();
            builder.vertex(Vec3::new(radius * sin, y, radius * cos), normal, [u, 1.0 - v]);
        }
    }

    let row = radial_segments + 1;
    for x in 0..radial_segments {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;
        builder.triangle(a, b, d);
        builder.triangle(b, c, d);
    }

    for top in [true, false] {
        let (radius, y, sign) = if top {
            (radius_top, half, 1.0)
        } else {
            (radius_bottom, -half, -1.0)
        };
        let normal = Vec3::new(0.0, sign, 0.0);

        let center_start = builder.positions.len() as u32;
        for x in 0..radial_segments {
            let u = (x as f32 + 0.5) / radial_segments as f32;
            builder.vertex(Vec3::new(0.0, y, 0.0), normal, [u, if top { 1.0 } else { 0.0 }]);
        }
        let ring_start = builder.positions.len() as u32;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            builder.vertex(
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
            );
        }

        for x in 0..radial_segments {
            let center = center_start + x;
            let i = ring_start + x;
            if top {
                builder.triangle(i, i + 1, center);
            } else {
                builder.triangle(i + 1, i, center);
            }
        }
    }

    builder.finish()
}

/// Axis-aligned box with one flat-shaded quad per face.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vec3::new(width, height, depth) * 0.5;
    let mut builder = Builder::default();

    // (normal, u axis, v axis) with u x v == normal so quads wind outward.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    for (normal, u_axis, v_axis) in faces {
        let center = normal * half;
        let corner = |su: f32, sv: f32| center + u_axis * half * su + v_axis * half * sv;
        let a = builder.vertex(corner(-1.0, -1.0), normal, [0.0, 1.0]);
        let b = builder.vertex(corner(1.0, -1.0), normal, [1.0, 1.0]);
        let c = builder.vertex(corner(1.0, 1.0), normal, [1.0, 0.0]);
        let d = builder.vertex(corner(-1.0, 1.0), normal, [0.0, 0.0]);
        builder.triangle(a, b, c);
        builder.triangle(a, c, d);
    }

    builder.finish()
}
