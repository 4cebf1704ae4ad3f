//! Front-facing planar UV projection.
//!
//! Vertices are projected along Z onto the portrait plane: `u` follows X and
//! `v` follows Y within the framed world rectangle. Back faces reuse the front
//! texels, since a single portrait has no information about the back.

use rigsmith_spec::Geometry;

use crate::config::SynthesisConfig;

pub const DEFAULT_INSET: f32 = 0.001;

/// World-space rectangle the portrait covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    /// UVs are clamped to `[inset, 1 - inset]`.
    pub inset: f32,
}

impl WorldBounds {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            inset: DEFAULT_INSET,
        }
    }

    /// Framing for a character standing on the origin: X within 90% of the
    /// half arm span, Y from the floor to 105% of the height.
    pub fn for_character(height: f32, arm_span: f32) -> Self {
        let half = arm_span * 0.5 * 0.9;
        Self::new(-half, half, 0.0, height * 1.05)
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        let half = config.arm_span * 0.5 * config.bounds_margin_x;
        Self {
            inset: config.uv_inset,
            ..Self::new(-half, half, 0.0, config.height * config.bounds_margin_y)
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// UV of a world position.
    pub fn uv(&self, x: f32, y: f32) -> [f32; 2] {
        let low = self.inset;
        let high = 1.0 - self.inset;
        let axis = |value: f32, min: f32, size: f32| {
            if size > 0.0 && size.is_finite() {
                ((value - min) / size).clamp(low, high)
            } else {
                low
            }
        };
        [
            axis(x, self.min_x, self.width()),
            axis(y, self.min_y, self.height()),
        ]
    }
}

/// Overwrites the UVs of `geometry` with the planar projection.
pub fn project(geometry: &mut Geometry, bounds: &WorldBounds) {
    let uvs = geometry
        .positions
        .iter()
        .map(|&[x, y, _]| bounds.uv(x, y))
        .collect();
    geometry.uvs = Some(uvs);
}
