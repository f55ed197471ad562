// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions: ordered clips of one kind with an overlap policy.

use crate::clip::{valid_timing, Clip, ClipId, ClipKind};
use crate::error::{Result, TimelineError, ValidationIssue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Character animation
    Animation,
    /// Audio playback
    Audio,
    /// Visual effects
    Vfx,
    /// Root motion
    Movement,
    /// Damage windows
    Damage,
    /// Camera cues
    Camera,
    /// Spawned objects
    Spawn,
    /// Scripted events
    Event,
}

impl TrackKind {
    /// The only clip kind this track accepts
    pub fn accepted_clip_kind(&self) -> ClipKind {
        match self {
            Self::Animation => ClipKind::Animation,
            Self::Audio => ClipKind::Audio,
            Self::Vfx => ClipKind::Vfx,
            Self::Movement => ClipKind::Movement,
            Self::Damage => ClipKind::Damage,
            Self::Camera => ClipKind::Camera,
            Self::Spawn => ClipKind::Spawn,
            Self::Event => ClipKind::Event,
        }
    }

    /// Whether clips on this track may overlap (for blending)
    pub fn allows_overlap(&self) -> bool {
        matches!(self, Self::Animation | Self::Audio)
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        self.accepted_clip_kind().name()
    }
}

/// A track in the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    /// Disabled tracks are skipped during playback
    pub enabled: bool,
    /// Locked tracks reject edits
    pub locked: bool,
    /// Clips sorted by start time
    clips: Vec<Clip>,
}

impl Track {
    /// Create a new track
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            enabled: true,
            locked: false,
            clips: Vec::new(),
        }
    }

    /// Add a clip, rejecting it if it breaks the track's invariants
    pub fn add_clip(&mut self, clip: Clip) -> Result<ClipId> {
        self.ensure_unlocked()?;
        self.check_fits(&clip, None)?;
        if self.clips.iter().any(|c| c.id == clip.id) {
            return Err(TimelineError::DuplicateClipId(clip.id));
        }
        let id = clip.id;
        self.clips.push(clip);
        self.sort_clips();
        Ok(id)
    }

    /// Remove a clip
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip> {
        self.ensure_unlocked()?;
        let idx = self
            .clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        Ok(self.clips.remove(idx))
    }

    /// Check whether `clip` could be placed on this track
    ///
    /// `ignore` skips one existing clip, used when the clip is being moved.
    pub fn check_fits(&self, clip: &Clip, ignore: Option<ClipId>) -> Result<()> {
        if clip.kind() != self.kind.accepted_clip_kind() {
            return Err(TimelineError::KindMismatch {
                track_kind: self.kind,
                clip_kind: clip.kind(),
            });
        }
        if !clip.has_valid_timing() {
            return Err(TimelineError::InvalidTiming {
                start: clip.start,
                duration: clip.duration,
            });
        }
        if !self.kind.allows_overlap() {
            if let Some(existing) = self
                .clips
                .iter()
                .filter(|c| Some(c.id) != ignore)
                .find(|c| c.overlaps(clip))
            {
                return Err(TimelineError::Overlap {
                    track: self.id,
                    clip: clip.id,
                    existing: existing.id,
                });
            }
        }
        Ok(())
    }

    /// Apply an edit to one clip, rolling it back if it breaks the invariants
    pub fn edit_clip(&mut self, clip_id: ClipId, edit: impl FnOnce(&mut Clip)) -> Result<()> {
        self.ensure_unlocked()?;
        let mut candidate = self
            .clip(clip_id)
            .cloned()
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        edit(&mut candidate);
        candidate.id = clip_id;
        self.check_fits(&candidate, Some(clip_id))?;
        if let Some(slot) = self.clips.iter_mut().find(|c| c.id == clip_id) {
            *slot = candidate;
        }
        self.sort_clips();
        Ok(())
    }

    /// Move a clip to a new start time
    pub fn move_clip(&mut self, clip_id: ClipId, new_start: f32) -> Result<()> {
        self.edit_clip(clip_id, |clip| clip.start = new_start)
    }

    /// Change a clip's duration
    pub fn resize_clip(&mut self, clip_id: ClipId, new_duration: f32) -> Result<()> {
        self.edit_clip(clip_id, |clip| clip.duration = new_duration)
    }

    /// Offset all clips by a time delta, clamping at zero
    ///
    /// Clamping can pile clips onto the origin, so the whole edit is rejected
    /// if it would create an overlap.
    pub fn offset_time(&mut self, delta: f32) -> Result<()> {
        self.transform_all(|clip| clip.start = (clip.start + delta).max(0.0))
    }

    /// Scale all clip starts and durations by a time factor
    pub fn scale_time(&mut self, factor: f32) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(TimelineError::InvalidTiming {
                start: 0.0,
                duration: factor,
            });
        }
        self.transform_all(|clip| {
            clip.start *= factor;
            clip.duration *= factor;
        })
    }

    fn transform_all(&mut self, f: impl Fn(&mut Clip)) -> Result<()> {
        self.ensure_unlocked()?;
        let mut edited = self.clone();
        edited.clips.iter_mut().for_each(&f);
        edited.sort_clips();
        let mut issues = Vec::new();
        edited.validate_into(&mut issues);
        if !issues.is_empty() {
            return Err(TimelineError::Validation(issues));
        }
        self.clips = edited.clips;
        Ok(())
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            Err(TimelineError::TrackLocked(self.id))
        } else {
            Ok(())
        }
    }

    fn sort_clips(&mut self) {
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    /// Get a clip by ID
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// Get all clips, sorted by start
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Get clip count
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Clips whose window contains `time`
    pub fn clips_at(&self, time: f32) -> Vec<&Clip> {
        self.clips.iter().filter(|c| c.contains(time)).collect()
    }

    /// End of the last clip
    pub fn end_time(&self) -> f32 {
        self.clips.iter().map(Clip::end).fold(0.0, f32::max)
    }

    /// Clone with a fresh track ID and fresh clip IDs
    pub fn duplicate(&self) -> Self {
        let mut track = self.clone();
        track.id = TrackId::new();
        for clip in &mut track.clips {
            clip.id = ClipId::new();
        }
        track
    }

    pub(crate) fn clips_mut(&mut self) -> impl Iterator<Item = &mut Clip> {
        self.clips.iter_mut()
    }

    pub(crate) fn validate_into(&self, issues: &mut Vec<ValidationIssue>) {
        let accepted = self.kind.accepted_clip_kind();
        for clip in &self.clips {
            if clip.kind() != accepted {
                issues.push(ValidationIssue::KindMismatch {
                    track: self.id,
                    track_kind: self.kind,
                    clip: clip.id,
                    clip_kind: clip.kind(),
                });
            }
            if !valid_timing(clip.start, clip.duration) {
                issues.push(ValidationIssue::InvalidTiming {
                    clip: clip.id,
                    start: clip.start,
                    duration: clip.duration,
                });
            }
        }

        if self.kind.allows_overlap() {
            return;
        }
        for (i, a) in self.clips.iter().enumerate() {
            for b in &self.clips[i + 1..] {
                if a.overlaps(b) {
                    issues.push(ValidationIssue::Overlap {
                        track: self.id,
                        first: a.id,
                        second: b.id,
                    });
                }
            }
        }
    }
}
