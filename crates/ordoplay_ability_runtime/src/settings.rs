// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner configuration.

use crate::registry::PlayMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Which handler set services the clips
    pub play_mode: PlayMode,
    /// Global play speed the session starts with
    pub initial_play_speed: f32,
    /// Largest scaled delta accepted per tick; larger steps are clamped
    pub max_tick_delta: Option<f32>,
    /// Let a clip whose handler failed enter again while its window is still open
    pub reenter_failed_clips: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Runtime,
            initial_play_speed: 1.0,
            max_tick_delta: None,
            reenter_failed_clips: false,
        }
    }
}

impl RunnerSettings {
    /// Settings for editor preview playback
    pub fn editor_preview() -> Self {
        Self {
            play_mode: PlayMode::EditorPreview,
            ..Self::default()
        }
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self
            .to_ron()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}
