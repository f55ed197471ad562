// SPDX-License-Identifier: MIT OR Apache-2.0
//! Organizational groups of tracks.

use crate::track::{Track, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random group ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// A named bucket of tracks; has no effect on playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group ID
    pub id: GroupId,
    /// Group name
    pub name: String,
    /// Tracks in author order
    tracks: IndexMap<TrackId, Track>,
}

impl Group {
    /// Create a new empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            tracks: IndexMap::new(),
        }
    }

    /// Add a track
    pub fn add_track(&mut self, track: Track) -> TrackId {
        let id = track.id;
        self.tracks.insert(id, track);
        id
    }

    /// Remove a track, keeping the order of the others
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        self.tracks.shift_remove(&track_id)
    }

    /// Get a track
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&track_id)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub(crate) fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    /// Get track count
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Clone with fresh group, track and clip IDs
    pub fn duplicate(&self) -> Self {
        Self {
            id: GroupId::new(),
            name: self.name.clone(),
            tracks: self
                .tracks
                .values()
                .map(|t| {
                    let track = t.duplicate();
                    (track.id, track)
                })
                .collect(),
        }
    }
}
