// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline: the root aggregate describing one ability sequence.

use crate::clip::{Clip, ClipId};
use crate::error::{Result, TimelineError, ValidationIssue};
use crate::group::{Group, GroupId};
use crate::track::{Track, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

/// An ability timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Serialized format version
    pub format_version: u32,
    /// Unique timeline ID
    pub id: TimelineId,
    /// Display name
    pub name: String,
    /// Author-facing version string
    pub version: String,
    /// Total duration; never shorter than the clip content, may run past it
    pub duration: f32,
    /// Whether playback wraps at the end
    pub looping: bool,
    /// Frame rate used for frame/time conversion in the editor
    pub frame_rate: f32,
    /// Groups in author order
    groups: IndexMap<GroupId, Group>,
}

impl Timeline {
    /// Current timeline format version
    pub const FORMAT_VERSION: u32 = 1;

    /// Create a new empty timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            id: TimelineId::new(),
            name: name.into(),
            version: "1.0".to_string(),
            duration: 0.0,
            looping: false,
            frame_rate: 30.0,
            groups: IndexMap::new(),
        }
    }

    /// Set the loop flag
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the authored duration, raised to cover the clip content
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.set_duration(duration);
        self
    }

    /// Set the authored duration, raised to cover the clip content
    pub fn set_duration(&mut self, duration: f32) -> f32 {
        self.duration = duration.max(0.0);
        self.recompute_duration()
    }

    /// Add a group
    pub fn add_group(&mut self, group: Group) -> GroupId {
        let id = group.id;
        self.groups.insert(id, group);
        self.recompute_duration();
        id
    }

    /// Remove a group together with its tracks
    ///
    /// The duration is left as is.
    pub fn remove_group(&mut self, group_id: GroupId) -> Option<Group> {
        self.groups.shift_remove(&group_id)
    }

    /// Get a group
    pub fn group(&self, group_id: GroupId) -> Option<&Group> {
        self.groups.get(&group_id)
    }

    /// Get a mutable group
    pub fn group_mut(&mut self, group_id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&group_id)
    }

    /// Get all groups
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Add a track to a group
    pub fn add_track(&mut self, group_id: GroupId, track: Track) -> Result<TrackId> {
        for clip in track.clips() {
            if self.find_clip(clip.id).is_some() {
                return Err(TimelineError::DuplicateClipId(clip.id));
            }
        }
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(TimelineError::GroupNotFound(group_id))?;
        let id = group.add_track(track);
        self.recompute_duration();
        Ok(id)
    }

    /// Remove a track from whichever group holds it
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        self.groups
            .values_mut()
            .find_map(|g| g.remove_track(track_id))
    }

    /// Get all tracks across groups, in order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.groups.values().flat_map(Group::tracks)
    }

    /// Get a track by ID
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.groups.values().find_map(|g| g.track(track_id))
    }

    /// Get a mutable track by ID
    ///
    /// Edits through the returned track do not refresh the duration; call
    /// [`Timeline::recompute_duration`] afterwards.
    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.groups.values_mut().find_map(|g| g.track_mut(track_id))
    }

    /// Add a clip to a track, enforcing timeline-wide id uniqueness
    pub fn add_clip(&mut self, track_id: TrackId, clip: Clip) -> Result<ClipId> {
        if self.find_clip(clip.id).is_some() {
            return Err(TimelineError::DuplicateClipId(clip.id));
        }
        let track = self
            .track_mut(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?;
        let id = track.add_clip(clip)?;
        self.recompute_duration();
        Ok(id)
    }

    /// Remove a clip from whichever track holds it
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip> {
        let track_id = self
            .find_clip(clip_id)
            .map(|(track, _)| track.id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        self.track_mut(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?
            .remove_clip(clip_id)
    }

    /// Find a clip and the track that owns it
    pub fn find_clip(&self, clip_id: ClipId) -> Option<(&Track, &Clip)> {
        self.tracks()
            .find_map(|t| t.clip(clip_id).map(|c| (t, c)))
    }

    /// Iterate every clip with its track
    pub fn clips(&self) -> impl Iterator<Item = (&Track, &Clip)> {
        self.tracks()
            .flat_map(|t| t.clips().iter().map(move |c| (t, c)))
    }

    /// Get clip count
    pub fn clip_count(&self) -> usize {
        self.tracks().map(Track::clip_count).sum()
    }

    /// Mutable walk over every clip, used by reference resolution
    pub(crate) fn for_each_clip_mut(&mut self, mut f: impl FnMut(TrackId, &mut Clip)) {
        for group in self.groups.values_mut() {
            for track in group.tracks_mut() {
                let track_id = track.id;
                for clip in track.clips_mut() {
                    f(track_id, clip);
                }
            }
        }
    }

    /// Get the duration required by the clip content
    pub fn content_duration(&self) -> f32 {
        self.tracks().map(Track::end_time).fold(0.0, f32::max)
    }

    /// Raise `duration` to cover the clip content
    ///
    /// Trailing time past the last clip is kept; use
    /// [`Timeline::fit_duration_to_content`] to drop it.
    pub fn recompute_duration(&mut self) -> f32 {
        self.duration = self.duration.max(self.content_duration());
        self.duration
    }

    /// Shrink or grow `duration` to exactly the clip content
    pub fn fit_duration_to_content(&mut self) -> f32 {
        self.duration = self.content_duration();
        self.duration
    }

    /// Collect every invariant violation
    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for track in self.tracks() {
            track.validate_into(&mut issues);
            for clip in track.clips() {
                if !seen.insert(clip.id) {
                    issues.push(ValidationIssue::DuplicateClipId(clip.id));
                }
            }
        }

        let content = self.content_duration();
        if self.duration < content {
            issues.push(ValidationIssue::StaleDuration {
                duration: self.duration,
                content,
            });
        }

        issues
    }

    /// Validate all invariants
    pub fn validate(&self) -> Result<()> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(TimelineError::Validation(issues))
        }
    }

    /// Deep clone with a fresh timeline ID and fresh clip IDs
    ///
    /// Group and track identities are kept so the copy has the same shape.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = TimelineId::new();
        copy.for_each_clip_mut(|_, clip| clip.id = ClipId::new());
        copy
    }

    /// Convert time to frame number
    pub fn time_to_frame(&self, time: f32) -> u32 {
        (time * self.frame_rate) as u32
    }

    /// Convert frame number to time
    pub fn frame_to_time(&self, frame: u32) -> f32 {
        frame as f32 / self.frame_rate
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("Untitled Ability")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AudioClip, EventClip, VfxClip};
    use crate::track::TrackKind;

    fn sample() -> (Timeline, TrackId) {
        let mut timeline = Timeline::new("Fireball");
        let group = timeline.add_group(Group::new("Main"));
        let track = timeline
            .add_track(group, Track::new("FX", TrackKind::Vfx))
            .unwrap();
        timeline
            .add_clip(track, Clip::new("cast", 0.0, 1.0, VfxClip::default()))
            .unwrap();
        timeline
            .add_clip(track, Clip::new("impact", 1.5, 0.5, VfxClip::default()))
            .unwrap();
        (timeline, track)
    }

    #[test]
    fn test_duration_tracks_content() {
        let (mut timeline, track) = sample();
        assert_eq!(timeline.duration, 2.0);
        timeline
            .add_clip(track, Clip::new("tail", 3.0, 1.0, VfxClip::default()))
            .unwrap();
        assert_eq!(timeline.duration, 4.0);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_stale_duration_is_reported() {
        let (mut timeline, _) = sample();
        timeline.duration = 1.0;
        let issues = timeline.validation_issues();
        assert!(matches!(issues.as_slice(), [ValidationIssue::StaleDuration { .. }]));
        timeline.recompute_duration();
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_edits_keep_trailing_duration() {
        let (timeline, track) = sample();
        let mut timeline = timeline.with_duration(3.0);
        assert_eq!(timeline.duration, 3.0);
        timeline
            .add_clip(track, Clip::new("late", 2.5, 0.25, VfxClip::default()))
            .unwrap();
        assert_eq!(timeline.duration, 3.0);
        assert!(timeline.validate().is_ok());

        // Too short a request is raised to the content
        assert_eq!(timeline.set_duration(1.0), 2.75);
    }

    #[test]
    fn test_rejects_duplicate_clip_id_across_tracks() {
        let (mut timeline, track) = sample();
        let existing = timeline.tracks().next().unwrap().clips()[0].clone();
        let group = timeline.groups().next().unwrap().id;
        let other = timeline
            .add_track(group, Track::new("FX 2", TrackKind::Vfx))
            .unwrap();
        assert!(matches!(
            timeline.add_clip(other, existing),
            Err(TimelineError::DuplicateClipId(_))
        ));
        assert_eq!(timeline.track(track).unwrap().clip_count(), 2);
    }

    #[test]
    fn test_validation_finds_overlap_in_raw_data() {
        let (timeline, _) = sample();
        // Forge an overlapping document the way a hand-edited file would
        let text = ron::to_string(&timeline).unwrap();
        let mut forged: Timeline = ron::from_str(&text).unwrap();
        let track_id = forged.tracks().next().unwrap().id;
        let first = forged.track(track_id).unwrap().clips()[0].id;
        forged.for_each_clip_mut(|_, clip| {
            if clip.id == first {
                clip.duration = 1.8;
            }
        });
        let issues = forged.validation_issues();
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::Overlap { .. })));
    }

    #[test]
    fn test_remove_group_removes_tracks() {
        let (mut timeline, track) = sample();
        let group = timeline.groups().next().unwrap().id;
        timeline.remove_group(group);
        assert!(timeline.track(track).is_none());
        assert_eq!(timeline.clip_count(), 0);
        assert_eq!(timeline.duration, 2.0);
        assert_eq!(timeline.fit_duration_to_content(), 0.0);
    }

    #[test]
    fn test_duplicate_keeps_shape_and_regenerates_clip_ids() {
        let (timeline, track) = sample();
        let copy = timeline.duplicate();
        assert_ne!(copy.id, timeline.id);
        assert_eq!(copy.clip_count(), timeline.clip_count());
        let original_ids: HashSet<_> = timeline.clips().map(|(_, c)| c.id).collect();
        assert!(copy.clips().all(|(_, c)| !original_ids.contains(&c.id)));
        assert_eq!(copy.track(track).unwrap().name, "FX");
        assert!(copy.validate().is_ok());
    }

    #[test]
    fn test_find_and_remove_clip() {
        let (mut timeline, track) = sample();
        let group = timeline.groups().next().unwrap().id;
        let audio = timeline
            .add_track(group, Track::new("SFX", TrackKind::Audio))
            .unwrap();
        let boom = timeline
            .add_clip(audio, Clip::new("boom", 0.0, 5.0, AudioClip::default()))
            .unwrap();
        assert_eq!(timeline.duration, 5.0);
        assert_eq!(timeline.find_clip(boom).map(|(t, _)| t.id), Some(audio));
        timeline.remove_clip(boom).unwrap();
        // Removing content never shortens the authored length
        assert_eq!(timeline.duration, 5.0);
        assert_eq!(timeline.fit_duration_to_content(), 2.0);
        assert!(timeline.find_clip(boom).is_none());
        assert!(timeline.track(track).is_some());
    }

    #[test]
    fn test_instant_clips_on_event_track() {
        let mut timeline = Timeline::new("Events");
        let group = timeline.add_group(Group::new("Main"));
        let track = timeline
            .add_track(group, Track::new("Events", TrackKind::Event))
            .unwrap();
        timeline
            .add_clip(track, Clip::new("a", 1.0, 0.0, EventClip::new("a")))
            .unwrap();
        timeline
            .add_clip(track, Clip::new("b", 1.0, 0.0, EventClip::new("b")))
            .unwrap();
        assert_eq!(timeline.duration, 1.0);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_frame_conversion() {
        let timeline = Timeline::new("t");
        assert_eq!(timeline.time_to_frame(1.0), 30);
        assert_eq!(timeline.frame_to_time(15), 0.5);
    }
}
