// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability playback engine for `OrdoPlay`.
//!
//! This crate plays ability timelines against a running game:
//! - Handler registry keyed by clip kind and play mode
//! - Per-session context with lazily cached services and scoped cleanup
//! - Pooled handler instances with an explicit lifecycle
//! - Runner scheduling enters, updates and exits as the cursor moves
//! - Audio and effect pools shared across sessions
//!
//! ## Architecture
//!
//! The runtime is built on:
//! - [`ClipProcess`] handlers, one type per clip kind and mode
//! - [`ProcessRegistry`], built once and shared between runners
//! - [`ServiceProvider`] capabilities supplied by the host game or editor
//! - [`Runner`], one per playing ability

pub mod context;
pub mod error;
pub mod pool;
pub mod process;
pub mod processes;
pub mod registry;
pub mod runner;
pub mod services;
pub mod settings;

#[cfg(test)]
mod testing;

pub use context::{CleanupToken, ProcessContext};
pub use error::{ProcessError, ProcessResult, RegistryError, RunnerError};
pub use pool::{
    AudioPool, AudioVoice, EffectInstance, EffectPool, InstancePool, PoolHandle, Pooled,
};
pub use process::{ClipProcess, ClipScope, InstanceId, ProcessState};
pub use registry::{PlayMode, ProcessRegistry, ProcessRegistryBuilder};
pub use runner::{ProcessFailure, ProcessPhase, Runner, RunnerState, RunnerStats};
pub use services::{
    ActorId, ActorRig, AnimationHandle, AnimationRequest, Animator, CameraCue, CameraRig,
    Capability, CharacterMotor, CombatSink, DebugDraw, EventSink, HitWindow, HitWindowId,
    ProjectileHandle, Service, ServiceKind, ServiceProvider, ServiceTable, SpawnRequest, Spawner,
    Transform,
};
pub use settings::RunnerSettings;
