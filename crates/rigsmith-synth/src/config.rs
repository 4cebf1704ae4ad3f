//! Synthesis configuration.

use serde::{Deserialize, Serialize};

use crate::error::SynthResult;

/// Measurements and texture handling for [`crate::synthesize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Character height in meters.
    pub height: f32,
    /// Fingertip to fingertip distance in meters.
    pub arm_span: f32,
    /// Pixels whose red, green and blue all exceed this become transparent.
    pub alpha_threshold: u8,
    /// UVs are clamped to `[uv_inset, 1 - uv_inset]`.
    pub uv_inset: f32,
    /// Fraction of the half arm span covered by the texture horizontally.
    pub bounds_margin_x: f32,
    /// Fraction of the height covered by the texture vertically.
    pub bounds_margin_y: f32,
    pub mesh_name: String,
    pub material_name: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            height: 1.75,
            arm_span: 1.6,
            alpha_threshold: 240,
            uv_inset: 0.001,
            bounds_margin_x: 0.9,
            bounds_margin_y: 1.05,
            mesh_name: "Humanoid_Mesh".to_string(),
            material_name: "Humanoid_Material".to_string(),
        }
    }
}

impl SynthesisConfig {
    pub fn from_json(json: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = SynthesisConfig::from_json(r#"{"height": 2.0}"#).unwrap();
        assert_eq!(config.height, 2.0);
        assert_eq!(config.arm_span, 1.6);
        assert_eq!(config.mesh_name, "Humanoid_Mesh");
    }

    #[test]
    fn test_invalid_json() {
        let err = SynthesisConfig::from_json("{").unwrap_err();
        assert_eq!(err.code(), "SYN_005");
    }
}
