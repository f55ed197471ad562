// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player errors.

use ordoplay_ability_runtime::{RegistryError, RunnerError};
use ordoplay_ability_timeline::TimelineError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for the player
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Anything that stops the player before or during a session
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Bad command line
    #[error("usage: ordoplay_ability_player <config.ron> | --write-demo <dir>")]
    Usage,

    /// The timeline file could not be imported or exported
    #[error("timeline: {0}")]
    Timeline(#[from] TimelineError),

    /// The built-in handler set could not be registered
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    /// The runner refused the timeline
    #[error("runner: {0}")]
    Runner(#[from] RunnerError),
}

impl PlayerError {
    /// Attach a path to an io error
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
