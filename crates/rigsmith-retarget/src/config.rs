//! Retarget configuration.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::root_motion::RootMotionSettings;

/// Options for [`crate::retarget`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetOptions {
    /// Rig name prefixes stripped from source node names before matching.
    /// Each entry is matched case-insensitively and may be followed by digits
    /// before the `:` separator (`mixamorig` covers `mixamorig1:`).
    pub vendor_prefixes: Vec<String>,
    pub root_motion: RootMotionSettings,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self {
            vendor_prefixes: vec!["mixamorig".to_string()],
            root_motion: RootMotionSettings::default(),
        }
    }
}

impl RetargetOptions {
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Case-insensitive `(<prefix>)\d*:` matcher over every vendor prefix,
    /// or `None` when no prefixes are configured.
    pub fn vendor_pattern(&self) -> Option<Regex> {
        if self.vendor_prefixes.is_empty() {
            return None;
        }
        let alternation = self
            .vendor_prefixes
            .iter()
            .map(|prefix| regex::escape(prefix))
            .collect::<Vec<_>>()
            .join("|");
        RegexBuilder::new(&format!(r"(?:{alternation})\d*:"))
            .case_insensitive(true)
            .build()
            .ok()
    }

    /// Removes every `<prefix><digits>:` from `name`, wherever it appears.
    pub fn strip_vendor_prefix<'a>(&self, name: &'a str) -> Cow<'a, str> {
        strip_vendor(self.vendor_pattern().as_ref(), name)
    }
}

pub(crate) fn strip_vendor<'a>(pattern: Option<&Regex>, name: &'a str) -> Cow<'a, str> {
    match pattern {
        Some(pattern) => pattern.replace_all(name, ""),
        None => Cow::Borrowed(name),
    }
}

/// Body proportion multipliers applied on top of a loaded character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelModifiers {
    pub height: f32,
    pub width: f32,
    pub head_size: f32,
    pub arm_thickness: f32,
    pub leg_thickness: f32,
    pub chest_size: f32,
}

impl Default for ModelModifiers {
    fn default() -> Self {
        Self {
            height: 1.0,
            width: 1.0,
            head_size: 1.0,
            arm_thickness: 1.0,
            leg_thickness: 1.0,
            chest_size: 1.0,
        }
    }
}

impl ModelModifiers {
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        Ok(serde_json::from_str(json)?)
    }
}
