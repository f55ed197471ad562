// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime error types.

use crate::registry::PlayMode;
use crate::runner::RunnerState;
use ordoplay_ability_timeline::{ClipKind, TimelineError};
use thiserror::Error;

/// Registry misconfiguration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two handlers claim the same (kind, mode) pair
    #[error("{kind:?}/{mode:?} is already handled by {existing}, cannot register {rejected}")]
    Duplicate {
        /// Clip kind
        kind: ClipKind,
        /// Play mode
        mode: PlayMode,
        /// Handler registered first
        existing: &'static str,
        /// Handler that was rejected
        rejected: &'static str,
    },

    /// No handler for a (kind, mode) pair
    #[error("no process registered for {kind:?} clips in {mode:?} mode")]
    NotFound {
        /// Clip kind
        kind: ClipKind,
        /// Play mode
        mode: PlayMode,
    },
}

/// Failure raised by a clip handler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// The handler was bound to a clip of another kind
    #[error("handler for {expected:?} clips was given a {found:?} clip")]
    KindMismatch {
        /// Kind the handler is typed to
        expected: ClipKind,
        /// Kind of the clip it received
        found: ClipKind,
    },

    /// A lifecycle call arrived in the wrong state
    #[error("cannot {operation} a process in state {state}")]
    InvalidState {
        /// Current state name
        state: &'static str,
        /// Rejected operation
        operation: &'static str,
    },

    /// A service call failed
    #[error("service error: {0}")]
    Service(String),

    /// Handler-specific failure
    #[error("{0}")]
    Failed(String),

    /// The handler panicked inside a callback
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl ProcessError {
    /// Build a [`ProcessError::Failed`] value
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Build a [`ProcessError::Panicked`] value from a panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = match payload.downcast::<String>() {
            Ok(msg) => *msg,
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(msg) => (*msg).to_string(),
                None => "non-string panic payload".to_string(),
            },
        };
        Self::Panicked(msg)
    }
}

/// Result type for handler callbacks
pub type ProcessResult = std::result::Result<(), ProcessError>;

/// Runner errors
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The timeline failed validation
    #[error("invalid timeline: {0}")]
    InvalidTimeline(#[from] TimelineError),

    /// The timeline uses a clip kind with no handler
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The operation needs a session that is playing or paused
    #[error("runner is {0:?}, operation needs an active session")]
    NotActive(RunnerState),
}
