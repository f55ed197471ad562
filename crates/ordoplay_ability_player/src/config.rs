// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration file.

use ordoplay_ability_runtime::RunnerSettings;
use ordoplay_ability_timeline::AssetManifest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the headless player needs for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Timeline file, relative to the config file
    pub timeline: PathBuf,
    /// Portable asset identities and the handles they stand for
    pub manifest: AssetManifest,
    /// Simulation step in seconds
    pub fixed_timestep: f64,
    /// Steps allowed per rendered frame before the backlog is dropped
    pub max_steps_per_frame: u32,
    /// Number of simulated frames
    pub frames: u32,
    /// Wall-clock time of one simulated frame
    pub frame_delta: f64,
    /// Settings handed to the runner
    pub runner: RunnerSettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            timeline: PathBuf::from("ability.ron"),
            manifest: AssetManifest::new(),
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 8,
            frames: 180,
            frame_delta: 1.0 / 60.0,
            runner: RunnerSettings::default(),
        }
    }
}

impl PlayerConfig {
    /// Load a config from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlayerConfig = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        Ok(config)
    }

    /// Save the config to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Timeline path resolved against the directory of `config_path`
    pub fn timeline_path(&self, config_path: &Path) -> PathBuf {
        if self.timeline.is_absolute() {
            return self.timeline.clone();
        }
        config_path
            .parent()
            .map_or_else(|| self.timeline.clone(), |dir| dir.join(&self.timeline))
    }
}
