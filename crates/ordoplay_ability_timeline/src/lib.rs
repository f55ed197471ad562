// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability timeline data model for `OrdoPlay`.
//!
//! This crate describes ability sequences as pure data:
//! - Timelines made of organizational groups
//! - Tracks of one clip kind with an overlap policy
//! - Timed clips (animation, audio, VFX, movement, damage, camera, spawn, event)
//! - External asset references with portable identities
//!
//! ## Architecture
//!
//! Clips are a shared timing envelope ([`Clip`]) around a closed set of
//! payload types ([`ClipPayload`]). Invariants (no overlap on exclusive
//! tracks, unique clip ids, non-negative timing) are enforced by the editing
//! methods and re-checked by [`Timeline::validate`] on import. Playback lives
//! in the runtime crate; nothing here has behavior.

pub mod asset;
pub mod bind;
pub mod clip;
pub mod curve;
pub mod error;
pub mod group;
pub mod resolver;
pub mod timeline;
pub mod track;

pub use asset::{AssetHandle, AssetKind, AssetRef};
pub use bind::{Attachment, BindPoint};
pub use clip::{
    AnimationClip, AudioClip, BlendMode, CameraClip, Clip, ClipData, ClipId, ClipKind, ClipPayload,
    DamageClip, EventClip, EventParam, HitShape, MovementClip, SpawnClip, VfxClip,
};
pub use curve::{Interpolation, MotionCurve};
pub use error::{Result, TimelineError, ValidationIssue};
pub use group::{Group, GroupId};
pub use resolver::{
    export, import, resolve_references, AssetManifest, AssetResolver, ImportedTimeline,
    ManifestEntry, UnresolvedReference,
};
pub use timeline::{Timeline, TimelineId};
pub use track::{Track, TrackId, TrackKind};
