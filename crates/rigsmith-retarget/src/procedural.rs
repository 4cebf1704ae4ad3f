//! Whole-character procedural motion for characters without an active clip.

use glam::{EulerRot, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rigsmith_spec::BoneTransform;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Procedural motion applied to the character root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    #[default]
    Static,
    Spin,
    Float,
    Pulse,
    Wobble,
    Shake,
    Orbit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Procedural animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    #[serde(rename = "type")]
    pub kind: MotionKind,
    /// Phase advance per second.
    pub speed: f32,
    pub intensity: f32,
    pub axis: Axis,
    /// Seed for `shake` jitter.
    pub seed: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            kind: MotionKind::Static,
            speed: 1.0,
            intensity: 1.0,
            axis: Axis::Y,
            seed: 0,
        }
    }
}

impl AnimationConfig {
    pub fn new(kind: MotionKind, speed: f32, intensity: f32, axis: Axis) -> Self {
        Self {
            kind,
            speed,
            intensity,
            axis,
            seed: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Named presets: "Slow Spin", "Fast Pulse" and "Ghost Float".
    pub fn presets() -> [(&'static str, AnimationConfig); 3] {
        [
            ("Slow Spin", Self::new(MotionKind::Spin, 0.5, 1.0, Axis::Y)),
            ("Fast Pulse", Self::new(MotionKind::Pulse, 3.0, 0.2, Axis::X)),
            ("Ghost Float", Self::new(MotionKind::Float, 1.5, 0.5, Axis::Y)),
        ]
    }

    pub fn preset(name: &str) -> Option<Self> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, config)| config)
    }
}

/// Root transform of the character `elapsed` seconds into the motion.
///
/// The motion phase is `elapsed * speed`. `shake` jitters each axis by up to
/// `0.05 * intensity`, drawn from a generator seeded by the config seed and
/// the phase, so equal inputs give equal output.
pub fn procedural_transform(config: &AnimationConfig, elapsed: f32) -> BoneTransform {
    let t = elapsed * config.speed;
    let i = config.intensity;
    let mut translation = Vec3::ZERO;
    let mut euler = Vec3::ZERO;
    let mut scale = Vec3::ONE;

    match config.kind {
        MotionKind::Static => {}
        MotionKind::Spin => euler = config.axis.unit() * t,
        MotionKind::Float => translation = config.axis.unit() * (t.sin() * 0.5 * i),
        MotionKind::Pulse => scale = Vec3::splat(1.0 + (t * 2.0).sin() * 0.2 * i),
        MotionKind::Wobble => {
            // Wobble rocks about Z unless X is asked for.
            let angle = t.sin() * 0.5 * i;
            euler = match config.axis {
                Axis::X => Vec3::X * angle,
                Axis::Y | Axis::Z => Vec3::Z * angle,
            };
        }
        MotionKind::Shake => {
            let mut rng = Pcg32::seed_from_u64(config.seed ^ u64::from(t.to_bits()));
            translation = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 0.1 * i,
                (rng.gen::<f32>() - 0.5) * 0.1 * i,
                (rng.gen::<f32>() - 0.5) * 0.1 * i,
            );
        }
        MotionKind::Orbit => {
            let radius = 2.0 * i;
            translation = Vec3::new(t.cos() * radius, 0.0, t.sin() * radius);
            euler = Vec3::Y * -t;
        }
    }

    BoneTransform::new(
        translation,
        Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
        scale,
    )
}
