// SPDX-License-Identifier: MIT OR Apache-2.0
//! External asset references held by clips.
//!
//! A clip never owns the animation, audio, effect or prefab it points at. It
//! holds an [`AssetRef`]: a live [`AssetHandle`] issued by the embedding
//! application plus the portable identity string that stands in for the
//! handle on disk. Between import and resolution the handle is `None`, which
//! is a valid state: playback simply skips the feature for that clip.

use serde::{Deserialize, Serialize};

/// Live handle into the embedding application's asset store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetHandle(pub u64);

/// Category of an external asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Animation clip
    Animation,
    /// Avatar/bone mask for layered animation
    AvatarMask,
    /// Audio clip
    Audio,
    /// Visual effect template
    Effect,
    /// Spawnable prefab
    Prefab,
}

impl AssetKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "Animation",
            Self::AvatarMask => "Avatar Mask",
            Self::Audio => "Audio",
            Self::Effect => "Effect",
            Self::Prefab => "Prefab",
        }
    }
}

/// Reference from a clip to an external asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Portable identity, the only part written to disk
    #[serde(default)]
    pub identity: Option<String>,
    /// Live handle, filled in by resolution
    #[serde(skip)]
    handle: Option<AssetHandle>,
}

impl AssetRef {
    /// An empty reference
    pub fn none() -> Self {
        Self::default()
    }

    /// Reference a live asset that has not been given an identity yet
    pub fn from_handle(handle: AssetHandle) -> Self {
        Self {
            identity: None,
            handle: Some(handle),
        }
    }

    /// Reference an asset by identity only (unresolved)
    pub fn from_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            handle: None,
        }
    }

    /// Reference an asset with both identity and live handle
    pub fn resolved(identity: impl Into<String>, handle: AssetHandle) -> Self {
        Self {
            identity: Some(identity.into()),
            handle: Some(handle),
        }
    }

    /// The live handle, if resolved
    pub fn handle(&self) -> Option<AssetHandle> {
        self.handle
    }

    /// Set the live handle
    pub fn set_handle(&mut self, handle: Option<AssetHandle>) {
        self.handle = handle;
    }

    /// Whether a live handle is present
    pub fn is_resolved(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the reference points at nothing at all
    pub fn is_empty(&self) -> bool {
        self.identity.is_none() && self.handle.is_none()
    }
}
