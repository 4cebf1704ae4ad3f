//! Canonical anatomical roles shared by every skeleton.

use serde::{Deserialize, Serialize};

/// One of the 20 anatomical joint categories used as the common vocabulary
/// between differently-named skeletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    Hips,
    Spine,
    Spine1,
    Spine2,
    Neck,
    Head,
    LeftShoulder,
    LeftArm,
    LeftForeArm,
    LeftHand,
    RightShoulder,
    RightArm,
    RightForeArm,
    RightHand,
    LeftUpLeg,
    LeftLeg,
    LeftFoot,
    RightUpLeg,
    RightLeg,
    RightFoot,
}

impl CanonicalRole {
    /// Number of canonical roles.
    pub const COUNT: usize = 20;

    /// All roles in declaration order.
    pub const ALL: [CanonicalRole; Self::COUNT] = [
        CanonicalRole::Hips,
        CanonicalRole::Spine,
        CanonicalRole::Spine1,
        CanonicalRole::Spine2,
        CanonicalRole::Neck,
        CanonicalRole::Head,
        CanonicalRole::LeftShoulder,
        CanonicalRole::LeftArm,
        CanonicalRole::LeftForeArm,
        CanonicalRole::LeftHand,
        CanonicalRole::RightShoulder,
        CanonicalRole::RightArm,
        CanonicalRole::RightForeArm,
        CanonicalRole::RightHand,
        CanonicalRole::LeftUpLeg,
        CanonicalRole::LeftLeg,
        CanonicalRole::LeftFoot,
        CanonicalRole::RightUpLeg,
        CanonicalRole::RightLeg,
        CanonicalRole::RightFoot,
    ];

    /// Returns the canonical bone name for this role (e.g. `"LeftForeArm"`).
    pub fn bone_name(&self) -> &'static str {
        match self {
            CanonicalRole::Hips => "Hips",
            CanonicalRole::Spine => "Spine",
            CanonicalRole::Spine1 => "Spine1",
            CanonicalRole::Spine2 => "Spine2",
            CanonicalRole::Neck => "Neck",
            CanonicalRole::Head => "Head",
            CanonicalRole::LeftShoulder => "LeftShoulder",
            CanonicalRole::LeftArm => "LeftArm",
            CanonicalRole::LeftForeArm => "LeftForeArm",
            CanonicalRole::LeftHand => "LeftHand",
            CanonicalRole::RightShoulder => "RightShoulder",
            CanonicalRole::RightArm => "RightArm",
            CanonicalRole::RightForeArm => "RightForeArm",
            CanonicalRole::RightHand => "RightHand",
            CanonicalRole::LeftUpLeg => "LeftUpLeg",
            CanonicalRole::LeftLeg => "LeftLeg",
            CanonicalRole::LeftFoot => "LeftFoot",
            CanonicalRole::RightUpLeg => "RightUpLeg",
            CanonicalRole::RightLeg => "RightLeg",
            CanonicalRole::RightFoot => "RightFoot",
        }
    }

    /// Position of this role in [`CanonicalRole::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Looks up a role by its exact canonical bone name.
    pub fn from_bone_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|role| role.bone_name() == name)
    }

    pub fn is_left(&self) -> bool {
        matches!(
            self,
            CanonicalRole::LeftShoulder
                | CanonicalRole::LeftArm
                | CanonicalRole::LeftForeArm
                | CanonicalRole::LeftHand
                | CanonicalRole::LeftUpLeg
                | CanonicalRole::LeftLeg
                | CanonicalRole::LeftFoot
        )
    }

    pub fn is_right(&self) -> bool {
        self.mirror() != *self && !self.is_left()
    }

    /// Returns the role on the opposite side of the body. Center roles map to
    /// themselves.
    pub fn mirror(&self) -> Self {
        match self {
            CanonicalRole::LeftShoulder => CanonicalRole::RightShoulder,
            CanonicalRole::LeftArm => CanonicalRole::RightArm,
            CanonicalRole::LeftForeArm => CanonicalRole::RightForeArm,
            CanonicalRole::LeftHand => CanonicalRole::RightHand,
            CanonicalRole::LeftUpLeg => CanonicalRole::RightUpLeg,
            CanonicalRole::LeftLeg => CanonicalRole::RightLeg,
            CanonicalRole::LeftFoot => CanonicalRole::RightFoot,
            CanonicalRole::RightShoulder => CanonicalRole::LeftShoulder,
            CanonicalRole::RightArm => CanonicalRole::LeftArm,
            CanonicalRole::RightForeArm => CanonicalRole::LeftForeArm,
            CanonicalRole::RightHand => CanonicalRole::LeftHand,
            CanonicalRole::RightUpLeg => CanonicalRole::LeftUpLeg,
            CanonicalRole::RightLeg => CanonicalRole::LeftLeg,
            CanonicalRole::RightFoot => CanonicalRole::LeftFoot,
            other => *other,
        }
    }

    /// Upper or lower arm segment on either side.
    pub fn is_arm(&self) -> bool {
        matches!(
            self,
            CanonicalRole::LeftArm
                | CanonicalRole::LeftForeArm
                | CanonicalRole::RightArm
                | CanonicalRole::RightForeArm
        )
    }

    /// Upper or lower leg segment on either side.
    pub fn is_leg(&self) -> bool {
        matches!(
            self,
            CanonicalRole::LeftUpLeg
                | CanonicalRole::LeftLeg
                | CanonicalRole::RightUpLeg
                | CanonicalRole::RightLeg
        )
    }

    pub fn is_spine(&self) -> bool {
        matches!(
            self,
            CanonicalRole::Spine | CanonicalRole::Spine1 | CanonicalRole::Spine2
        )
    }
}

impl std::fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.bone_name())
    }
}
