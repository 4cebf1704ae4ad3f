//! Hip track normalization.
//!
//! The hip bone carries the character's overall placement, so its keys are
//! re-anchored rather than copied: rotations become deltas from the clip's
//! first frame recomposed onto the target's bind rotation, and translations
//! are pinned in place horizontally with an optional centimeter-to-meter
//! rescale of the vertical axis.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Tuning for hip translation handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootMotionSettings {
    /// Zero the X and Z components of every hip translation key.
    pub lock_horizontal: bool,
    /// Vertical magnitude above which a key is assumed to be in centimeters.
    pub unit_rescale_threshold: f32,
    /// Rescaling only applies when the target is shorter than this.
    pub max_target_height: f32,
    /// Factor applied to a rescaled vertical component.
    pub unit_scale: f32,
}

impl Default for RootMotionSettings {
    fn default() -> Self {
        Self {
            lock_horizontal: true,
            unit_rescale_threshold: 50.0,
            max_target_height: 10.0,
            unit_scale: 0.01,
        }
    }
}

/// Rewrites hip keys for one target skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMotionNormalizer {
    /// Local bind rotation of the target's hip bone, if known.
    pub hips_bind_rotation: Option<Quat>,
    /// Target character height in its own units.
    pub target_height: f32,
    pub settings: RootMotionSettings,
}

impl RootMotionNormalizer {
    pub fn new(
        hips_bind_rotation: Option<Quat>,
        target_height: f32,
        settings: RootMotionSettings,
    ) -> Self {
        Self {
            hips_bind_rotation,
            target_height,
            settings,
        }
    }

    /// Replaces each key with `bind * (first⁻¹ * key)`. Without a bind
    /// rotation the keys are left untouched.
    ///
    /// Returns whether the keys were rewritten.
    pub fn normalize_rotation(&self, keys: &mut [Quat]) -> bool {
        let (Some(bind), Some(&first)) = (self.hips_bind_rotation, keys.first()) else {
            return false;
        };
        let start_inverse = first.inverse();
        for key in keys.iter_mut() {
            *key = (bind * (start_inverse * *key)).normalize();
        }
        true
    }

    /// Pins horizontal motion and rescales implausibly large vertical values.
    ///
    /// The unit check runs per key, so a clip whose hip height straddles the
    /// threshold is rescaled only on the keys above it. This is a heuristic
    /// for centimeter-authored clips, not a unit detector.
    ///
    /// Returns the number of keys whose vertical component was rescaled.
    pub fn normalize_translation(&self, keys: &mut [Vec3]) -> usize {
        let settings = &self.settings;
        let rescale_allowed = self.target_height < settings.max_target_height;
        let mut rescaled = 0;
        for key in keys.iter_mut() {
            if settings.lock_horizontal {
                key.x = 0.0;
                key.z = 0.0;
            }
            if rescale_allowed && key.y.abs() > settings.unit_rescale_threshold {
                key.y *= settings.unit_scale;
                rescaled += 1;
            }
        }
        rescaled
    }
}
