// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while authoring, validating and (de)serializing timelines.

use crate::clip::{ClipId, ClipKind};
use crate::group::GroupId;
use crate::track::{TrackId, TrackKind};
use thiserror::Error;

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// A single data invariant violation found by validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    /// Two clips on an overlap-forbidding track intersect
    #[error("clips {first:?} and {second:?} overlap on track {track:?}")]
    Overlap {
        /// Track holding both clips
        track: TrackId,
        /// Earlier clip
        first: ClipId,
        /// Later clip
        second: ClipId,
    },

    /// The same clip id appears more than once in a timeline
    #[error("clip id {0:?} is used more than once")]
    DuplicateClipId(ClipId),

    /// A clip's payload does not match the kind its track accepts
    #[error("track {track:?} of kind {track_kind:?} cannot hold a {clip_kind:?} clip ({clip:?})")]
    KindMismatch {
        /// Offending track
        track: TrackId,
        /// Kind of the track
        track_kind: TrackKind,
        /// Offending clip
        clip: ClipId,
        /// Kind of the clip payload
        clip_kind: ClipKind,
    },

    /// A clip has a negative or non-finite start or duration
    #[error("clip {clip:?} has invalid timing (start {start}, duration {duration})")]
    InvalidTiming {
        /// Offending clip
        clip: ClipId,
        /// Start time
        start: f32,
        /// Duration
        duration: f32,
    },

    /// The stored duration is shorter than the clip content
    #[error("timeline duration {duration} is shorter than its content ({content})")]
    StaleDuration {
        /// Stored duration
        duration: f32,
        /// Required duration
        content: f32,
    },
}

/// Timeline errors
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Adding or moving a clip would make it overlap another one
    #[error("clip {clip:?} would overlap clip {existing:?} on track {track:?}")]
    Overlap {
        /// Track being edited
        track: TrackId,
        /// Clip being inserted or moved
        clip: ClipId,
        /// Clip already occupying the window
        existing: ClipId,
    },

    /// The clip kind does not belong on the track
    #[error("track of kind {track_kind:?} does not accept {clip_kind:?} clips")]
    KindMismatch {
        /// Kind of the track
        track_kind: TrackKind,
        /// Kind of the rejected clip
        clip_kind: ClipKind,
    },

    /// Start or duration is negative or not finite
    #[error("invalid clip timing (start {start}, duration {duration})")]
    InvalidTiming {
        /// Rejected start time
        start: f32,
        /// Rejected duration
        duration: f32,
    },

    /// A clip with this id already exists in the timeline
    #[error("clip id {0:?} already exists")]
    DuplicateClipId(ClipId),

    /// Group not found
    #[error("group not found: {0:?}")]
    GroupNotFound(GroupId),

    /// Track not found
    #[error("track not found: {0:?}")]
    TrackNotFound(TrackId),

    /// Clip not found
    #[error("clip not found: {0:?}")]
    ClipNotFound(ClipId),

    /// The track is locked against editing
    #[error("track {0:?} is locked")]
    TrackLocked(TrackId),

    /// One or more invariants are violated
    #[error("timeline failed validation with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// Serialized timeline was written by a newer format
    #[error("timeline format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
}
