//! Joint name to canonical role classification.
//!
//! A [`RoleTable`] is an ordered list of rules, one per role, each holding an
//! ordered list of case-insensitive regular expressions. Classification walks
//! the roles in table order and returns the first role with a matching
//! pattern, so more specific roles (ForeArm, UpLeg, Spine2) must be listed
//! before the looser ones that would also match them (Arm, Leg, Spine).

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use rigsmith_spec::{CanonicalRole, Skeleton};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Serializable pattern list for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePatterns {
    pub role: CanonicalRole,
    pub patterns: Vec<String>,
}

impl RolePatterns {
    pub fn new(role: CanonicalRole, patterns: Vec<String>) -> Self {
        Self { role, patterns }
    }
}

#[derive(Debug, Clone)]
struct RoleRule {
    role: CanonicalRole,
    matchers: Vec<Regex>,
}

/// Ordered role classification table.
#[derive(Debug, Clone)]
pub struct RoleTable {
    rules: Vec<RoleRule>,
}

static STANDARD_TABLE: OnceLock<RoleTable> = OnceLock::new();

// A side marker: the word "left", or a lone "l" delimited by non-alphanumerics
// ("Bip001 L Thigh", "thigh_l").
const LEFT: &str = r"(?:left|(?:^|[^a-z0-9])l(?:[^a-z0-9]|$))";
const RIGHT: &str = r"(?:right|(?:^|[^a-z0-9])r(?:[^a-z0-9]|$))";

const SHOULDER: &str = r"(?:shoulder|clavicle|collar)";
const FORE_ARM: &str = r"(?:fore[^a-z0-9]?arm|lower[^a-z0-9]?arm|elbow)";
const ARM: &str = r"arm";
const HAND: &str = r"(?:hand|wrist)";
const UP_LEG: &str = r"(?:up[^a-z0-9]?leg|upper[^a-z0-9]?leg|thigh)";
const LEG: &str = r"(?:leg|calf|shin|knee)";
const FOOT: &str = r"(?:foot|ankle)";

fn sided(side: &str, body: &str) -> Vec<String> {
    vec![format!("{side}.*{body}"), format!("{body}.*{side}")]
}

fn plain(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

/// Pattern lists of the standard table, in classification order.
///
/// Covers Mixamo (`mixamorig:LeftForeArm`), 3ds Max biped (`Bip001 L
/// UpperArm`), Unreal (`upperarm_l`, `spine_02`) and the canonical names.
pub fn standard_patterns() -> Vec<RolePatterns> {
    use CanonicalRole::*;

    let mut table = vec![
        RolePatterns::new(Hips, plain(&["hips", "pelvis", "root"])),
        RolePatterns::new(
            Spine2,
            plain(&[
                r"spine[^a-z0-9]?2(?:[^0-9]|$)",
                r"spine[^a-z0-9]?0?3(?:[^0-9]|$)",
                r"upper[^a-z0-9]?chest",
            ]),
        ),
        RolePatterns::new(
            Spine1,
            plain(&[
                r"spine[^a-z0-9]?1(?:[^0-9]|$)",
                r"spine[^a-z0-9]?02(?:[^0-9]|$)",
                "chest",
            ]),
        ),
        RolePatterns::new(Spine, plain(&["spine"])),
        RolePatterns::new(Neck, plain(&["neck"])),
        RolePatterns::new(Head, plain(&["head"])),
    ];

    for (side, roles) in [
        (LEFT, [LeftShoulder, LeftForeArm, LeftArm, LeftHand]),
        (RIGHT, [RightShoulder, RightForeArm, RightArm, RightHand]),
    ] {
        for (role, body) in roles.into_iter().zip([SHOULDER, FORE_ARM, ARM, HAND]) {
            table.push(RolePatterns::new(role, sided(side, body)));
        }
    }

    for (side, roles) in [
        (LEFT, [LeftUpLeg, LeftLeg, LeftFoot]),
        (RIGHT, [RightUpLeg, RightLeg, RightFoot]),
    ] {
        for (role, body) in roles.into_iter().zip([UP_LEG, LEG, FOOT]) {
            table.push(RolePatterns::new(role, sided(side, body)));
        }
    }

    table
}

impl RoleTable {
    /// The built-in table. Compiled once per process.
    pub fn standard() -> Self {
        STANDARD_TABLE
            .get_or_init(|| {
                Self::from_patterns(&standard_patterns()).expect("standard role patterns are valid")
            })
            .clone()
    }

    /// Compiles a table from ordered pattern lists.
    pub fn from_patterns(patterns: &[RolePatterns]) -> Result<Self, ClassifierError> {
        let mut rules: Vec<RoleRule> = Vec::with_capacity(patterns.len());
        for entry in patterns {
            if rules.iter().any(|rule| rule.role == entry.role) {
                return Err(ClassifierError::DuplicateRole(entry.role));
            }
            let matchers = entry
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| ClassifierError::InvalidPattern {
                            role: entry.role,
                            pattern: pattern.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(RoleRule {
                role: entry.role,
                matchers,
            });
        }
        Ok(Self { rules })
    }

    /// Parses a JSON array of `{ "role": ..., "patterns": [...] }` entries.
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let patterns: Vec<RolePatterns> = serde_json::from_str(json)?;
        Self::from_patterns(&patterns)
    }

    /// Roles in classification order.
    pub fn roles(&self) -> impl Iterator<Item = CanonicalRole> + '_ {
        self.rules.iter().map(|rule| rule.role)
    }

    /// Returns the first role whose patterns match `name`.
    pub fn classify(&self, name: &str) -> Option<CanonicalRole> {
        self.rules
            .iter()
            .find(|rule| rule.matchers.iter().any(|matcher| matcher.is_match(name)))
            .map(|rule| rule.role)
    }

    /// Assigns each role to the first bone, in skeleton order, that
    /// classifies to it.
    pub fn assign(&self, skeleton: &Skeleton) -> RoleMap {
        let mut map = RoleMap::default();
        for (index, bone) in skeleton.bones().iter().enumerate() {
            if let Some(role) = self.classify(&bone.name) {
                let slot = &mut map.bones[role.index()];
                if slot.is_none() {
                    *slot = Some(index);
                }
            }
        }
        map
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Role to bone index assignment for one skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleMap {
    bones: [Option<usize>; CanonicalRole::COUNT],
}

impl RoleMap {
    pub fn get(&self, role: CanonicalRole) -> Option<usize> {
        self.bones[role.index()]
    }

    /// Number of roles with a bone.
    pub fn len(&self) -> usize {
        self.bones.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assigned `(role, bone index)` pairs in role declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalRole, usize)> + '_ {
        CanonicalRole::ALL
            .iter()
            .zip(self.bones.iter())
            .filter_map(|(&role, &bone)| bone.map(|bone| (role, bone)))
    }

    /// Role of a bone, if the bone won one.
    pub fn role_of(&self, bone: usize) -> Option<CanonicalRole> {
        self.iter().find(|&(_, b)| b == bone).map(|(role, _)| role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rigsmith_spec::{Bone, BoneTransform};
    use CanonicalRole::*;

    #[test]
    fn test_mixamo_fore_arm_not_caught_by_arm() {
        let table = RoleTable::standard();
        assert_eq!(table.classify("mixamorig:LeftForeArm"), Some(LeftForeArm));
        assert_eq!(table.classify("mixamorig:LeftArm"), Some(LeftArm));
        assert_eq!(table.classify("mixamorig:RightForeArm"), Some(RightForeArm));
        assert_eq!(table.classify("mixamorig:RightArm"), Some(RightArm));
    }

    #[test]
    fn test_canonical_names_classify_to_themselves() {
        let table = RoleTable::standard();
        for role in CanonicalRole::ALL {
            assert_eq!(table.classify(role.bone_name()), Some(role), "{}", role);
        }
    }

    #[test]
    fn test_biped_names() {
        let table = RoleTable::standard();
        let cases = [
            ("Bip001 Pelvis", Hips),
            ("Bip001 Spine", Spine),
            ("Bip001 Spine1", Spine1),
            ("Bip001 Neck", Neck),
            ("Bip001 Head", Head),
            ("Bip001 L Clavicle", LeftShoulder),
            ("Bip001 L UpperArm", LeftArm),
            ("Bip001 L Forearm", LeftForeArm),
            ("Bip001 R Hand", RightHand),
            ("Bip001 L Thigh", LeftUpLeg),
            ("Bip001 R Calf", RightLeg),
            ("Bip001 R Foot", RightFoot),
        ];
        for (name, role) in cases {
            assert_eq!(table.classify(name), Some(role), "{}", name);
        }
    }

    #[test]
    fn test_unreal_names() {
        let table = RoleTable::standard();
        let cases = [
            ("pelvis", Hips),
            ("spine_01", Spine),
            ("spine_02", Spine1),
            ("spine_03", Spine2),
            ("neck_01", Neck),
            ("clavicle_l", LeftShoulder),
            ("upperarm_l", LeftArm),
            ("lowerarm_r", RightForeArm),
            ("hand_r", RightHand),
            ("thigh_r", RightUpLeg),
            ("calf_l", LeftLeg),
            ("foot_l", LeftFoot),
        ];
        for (name, role) in cases {
            assert_eq!(table.classify(name), Some(role), "{}", name);
        }
    }

    #[test]
    fn test_unknown_names() {
        let table = RoleTable::standard();
        assert_eq!(table.classify("Tail_03"), None);
        assert_eq!(table.classify(""), None);
        assert_eq!(table.classify("Armature"), None);
    }

    #[test]
    fn test_case_insensitive() {
        let table = RoleTable::standard();
        assert_eq!(table.classify("LEFTFOREARM"), Some(LeftForeArm));
        assert_eq!(table.classify("hips"), Some(Hips));
    }

    #[test]
    fn test_custom_table_order_matters() {
        let loose_first = RoleTable::from_patterns(&[
            RolePatterns::new(LeftArm, vec!["left.*arm".to_string()]),
            RolePatterns::new(LeftForeArm, vec!["left.*forearm".to_string()]),
        ])
        .unwrap();
        assert_eq!(loose_first.classify("LeftForeArm"), Some(LeftArm));
    }

    #[test]
    fn test_from_json() {
        let table = RoleTable::from_json(r#"[{"role": "head", "patterns": ["kopf"]}]"#).unwrap();
        assert_eq!(table.classify("Kopf"), Some(Head));
        assert_eq!(table.roles().collect::<Vec<_>>(), vec![Head]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RoleTable::from_patterns(&[RolePatterns::new(Head, vec!["(".to_string()])])
            .unwrap_err();
        assert_eq!(err.code(), "ROLE_001");
    }

    #[test]
    fn test_duplicate_role() {
        let err = RoleTable::from_patterns(&[
            RolePatterns::new(Head, vec!["head".to_string()]),
            RolePatterns::new(Head, vec!["kopf".to_string()]),
        ])
        .unwrap_err();
        assert!(matches!(err, ClassifierError::DuplicateRole(Head)));
    }

    #[test]
    fn test_assign_first_bone_wins() {
        let skeleton = Skeleton::new(vec![
            Bone::new("Hips", None, BoneTransform::IDENTITY),
            Bone::new("Head", Some(0), BoneTransform::IDENTITY),
            Bone::new("HeadTop_End", Some(1), BoneTransform::IDENTITY),
        ])
        .unwrap();
        let map = RoleTable::standard().assign(&skeleton);
        assert_eq!(map.get(Hips), Some(0));
        assert_eq!(map.get(Head), Some(1));
        assert_eq!(map.get(LeftArm), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.role_of(1), Some(Head));
        assert_eq!(map.role_of(2), None);
    }
}
