// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attachment points on the controlled character.

use serde::{Deserialize, Serialize};

/// Named attachment location on a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BindPoint {
    /// Character root (feet level)
    #[default]
    Root,
    /// Head bone
    Head,
    /// Chest/spine bone
    Chest,
    /// Left hand
    LeftHand,
    /// Right hand
    RightHand,
    /// Left foot
    LeftFoot,
    /// Right foot
    RightFoot,
    /// Weapon socket
    Weapon,
    /// Bone looked up by name
    Custom,
}

impl BindPoint {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Head => "Head",
            Self::Chest => "Chest",
            Self::LeftHand => "Left Hand",
            Self::RightHand => "Right Hand",
            Self::LeftFoot => "Left Foot",
            Self::RightFoot => "Right Foot",
            Self::Weapon => "Weapon",
            Self::Custom => "Custom",
        }
    }
}

/// Where a spawned object is placed relative to the character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment point
    pub bind_point: BindPoint,
    /// Bone name, used when `bind_point` is [`BindPoint::Custom`]
    #[serde(default)]
    pub custom_bone: String,
    /// Positional offset from the bind point
    pub offset: [f32; 3],
    /// Euler rotation offset in degrees
    pub rotation: [f32; 3],
}

impl Attachment {
    /// Attach at a bind point with no offset
    pub fn at(bind_point: BindPoint) -> Self {
        Self {
            bind_point,
            ..Self::default()
        }
    }

    /// Attach to a named bone
    pub fn bone(name: impl Into<String>) -> Self {
        Self {
            bind_point: BindPoint::Custom,
            custom_bone: name.into(),
            ..Self::default()
        }
    }

    /// Set the positional offset
    pub fn with_offset(mut self, offset: [f32; 3]) -> Self {
        self.offset = offset;
        self
    }

    /// Bone name passed to the rig lookup, empty unless custom
    pub fn custom_name(&self) -> &str {
        match self.bind_point {
            BindPoint::Custom => &self.custom_bone,
            _ => "",
        }
    }
}

impl Default for Attachment {
    fn default() -> Self {
        Self {
            bind_point: BindPoint::Root,
            custom_bone: String::new(),
            offset: [0.0; 3],
            rotation: [0.0; 3],
        }
    }
}
