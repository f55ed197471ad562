// SPDX-License-Identifier: MIT OR Apache-2.0
//! Portable export/import of timelines.
//!
//! Export stamps every live asset handle with its portable identity and
//! writes the whole graph as pretty RON. Import reads the graph back,
//! validates it and resolves each identity to a live handle. Identities that
//! fail to resolve leave the handle empty and are reported as warnings; the
//! rest of the timeline stays playable.

use crate::asset::{AssetHandle, AssetKind};
use crate::clip::ClipId;
use crate::error::{Result, TimelineError};
use crate::timeline::Timeline;
use crate::track::TrackId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maps live asset handles to portable identities and back
pub trait AssetResolver {
    /// Portable identity of a live asset
    fn identity_of(&self, kind: AssetKind, handle: AssetHandle) -> Option<String>;

    /// Live asset for a portable identity
    fn resolve(&self, kind: AssetKind, identity: &str) -> Option<AssetHandle>;
}

/// A reference that could not be resolved on import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Track holding the clip
    pub track: TrackId,
    /// Clip holding the reference
    pub clip: ClipId,
    /// Expected asset kind
    pub kind: AssetKind,
    /// Identity that failed to resolve
    pub identity: String,
}

/// Result of importing a timeline
#[derive(Debug, Clone)]
pub struct ImportedTimeline {
    /// The imported graph
    pub timeline: Timeline,
    /// References left unresolved
    pub unresolved: Vec<UnresolvedReference>,
}

impl ImportedTimeline {
    /// Whether every reference resolved
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Serialize a timeline to portable RON text
///
/// The duration is raised to cover the clip content and the graph validated
/// before writing, so a saved file never carries a stale duration or a broken
/// invariant. Authored time past the last clip is kept.
pub fn export(timeline: &Timeline, resolver: &dyn AssetResolver) -> Result<String> {
    let mut portable = timeline.clone();
    portable.recompute_duration();
    portable.validate()?;

    portable.for_each_clip_mut(|_, clip| {
        let clip_id = clip.id;
        for (kind, asset) in clip.asset_refs_mut() {
            let Some(handle) = asset.handle() else {
                continue;
            };
            match resolver.identity_of(kind, handle) {
                Some(identity) => asset.identity = Some(identity),
                None if asset.identity.is_some() => {}
                None => tracing::warn!(
                    "{} asset {:?} on clip {:?} has no portable identity and will be exported empty",
                    kind.name(),
                    handle,
                    clip_id
                ),
            }
        }
    });

    Ok(to_ron(&portable)?)
}

/// Read a timeline from portable RON text and resolve its references
pub fn import(text: &str, resolver: &dyn AssetResolver) -> Result<ImportedTimeline> {
    let mut timeline: Timeline = ron::from_str(text)?;

    if timeline.format_version > Timeline::FORMAT_VERSION {
        return Err(TimelineError::UnsupportedVersion {
            found: timeline.format_version,
            supported: Timeline::FORMAT_VERSION,
        });
    }
    timeline.validate()?;

    let unresolved = resolve_references(&mut timeline, resolver);
    if unresolved.is_empty() {
        tracing::debug!("Imported timeline '{}' with all references resolved", timeline.name);
    } else {
        tracing::warn!(
            "Imported timeline '{}' with {} unresolved reference(s)",
            timeline.name,
            unresolved.len()
        );
    }

    Ok(ImportedTimeline {
        timeline,
        unresolved,
    })
}

/// Resolve every stored identity in place
///
/// Safe to call again later (for example once a missing asset has been
/// loaded); references that fail keep an empty handle.
pub fn resolve_references(
    timeline: &mut Timeline,
    resolver: &dyn AssetResolver,
) -> Vec<UnresolvedReference> {
    let mut unresolved = Vec::new();

    timeline.for_each_clip_mut(|track, clip| {
        let clip_id = clip.id;
        for (kind, asset) in clip.asset_refs_mut() {
            let Some(identity) = asset.identity.clone() else {
                continue;
            };
            let handle = resolver.resolve(kind, &identity);
            asset.set_handle(handle);
            if handle.is_none() {
                tracing::warn!(
                    "Unresolved {} reference '{}' on clip {:?}",
                    kind.name(),
                    identity,
                    clip_id
                );
                unresolved.push(UnresolvedReference {
                    track,
                    clip: clip_id,
                    kind,
                    identity,
                });
            }
        }
    });

    unresolved
}

fn to_ron(timeline: &Timeline) -> std::result::Result<String, ron::Error> {
    let config = ron::ser::PrettyConfig::default()
        .struct_names(true)
        .enumerate_arrays(false);
    ron::ser::to_string_pretty(timeline, config)
}

/// Table-backed resolver: identity strings mapped to handles per kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Entries in insertion order
    entries: IndexMap<String, ManifestEntry>,
}

/// One asset known to a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Asset kind
    pub kind: AssetKind,
    /// Live handle
    pub handle: AssetHandle,
}

impl AssetManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset
    pub fn insert(&mut self, identity: impl Into<String>, kind: AssetKind, handle: AssetHandle) {
        self.entries.insert(identity.into(), ManifestEntry { kind, handle });
    }

    /// Builder-style [`AssetManifest::insert`]
    pub fn with(mut self, identity: impl Into<String>, kind: AssetKind, handle: AssetHandle) -> Self {
        self.insert(identity, kind, handle);
        self
    }

    /// Forget an asset
    pub fn remove(&mut self, identity: &str) -> Option<ManifestEntry> {
        self.entries.shift_remove(identity)
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetResolver for AssetManifest {
    fn identity_of(&self, kind: AssetKind, handle: AssetHandle) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, e)| e.kind == kind && e.handle == handle)
            .map(|(identity, _)| identity.clone())
    }

    fn resolve(&self, kind: AssetKind, identity: &str) -> Option<AssetHandle> {
        self.entries
            .get(identity)
            .filter(|e| e.kind == kind)
            .map(|e| e.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRef;
    use crate::clip::{
        AnimationClip, AudioClip, Clip, EventClip, EventParam, SpawnClip, VfxClip,
    };
    use crate::group::Group;
    use crate::track::{Track, TrackKind};

    fn manifest() -> AssetManifest {
        AssetManifest::new()
            .with("anim/cast", AssetKind::Animation, AssetHandle(1))
            .with("sfx/whoosh", AssetKind::Audio, AssetHandle(2))
            .with("fx/fireball", AssetKind::Effect, AssetHandle(3))
            .with("prefab/bolt", AssetKind::Prefab, AssetHandle(4))
    }

    fn fireball() -> Timeline {
        let mut timeline = Timeline::new("Fireball").with_looping(true);
        let group = timeline.add_group(Group::new("Main"));
        let anim = timeline
            .add_track(group, Track::new("Body", TrackKind::Animation))
            .unwrap();
        let audio = timeline
            .add_track(group, Track::new("SFX", TrackKind::Audio))
            .unwrap();
        let fx = timeline
            .add_track(group, Track::new("FX", TrackKind::Vfx))
            .unwrap();
        let spawn = timeline
            .add_track(group, Track::new("Spawn", TrackKind::Spawn))
            .unwrap();
        let events = timeline
            .add_track(group, Track::new("Events", TrackKind::Event))
            .unwrap();

        let cast = AnimationClip {
            animation: AssetRef::resolved("anim/cast", AssetHandle(1)),
            ..AnimationClip::default()
        };
        timeline.add_clip(anim, Clip::new("cast", 0.0, 1.2, cast)).unwrap();
        let whoosh = AudioClip {
            audio: AssetRef::from_handle(AssetHandle(2)),
            volume: 0.8,
            ..AudioClip::default()
        };
        timeline.add_clip(audio, Clip::new("whoosh", 0.2, 0.5, whoosh)).unwrap();
        let glow = VfxClip {
            effect: AssetRef::resolved("fx/fireball", AssetHandle(3)),
            ..VfxClip::default()
        };
        timeline.add_clip(fx, Clip::new("glow", 0.0, 1.0, glow)).unwrap();
        let bolt = SpawnClip {
            prefab: AssetRef::resolved("prefab/bolt", AssetHandle(4)),
            event_tag: "bolt".to_string(),
            ..SpawnClip::default()
        };
        timeline.add_clip(spawn, Clip::new("bolt", 1.0, 0.0, bolt)).unwrap();
        let event = EventClip::new("cast_finished")
            .with_param("mana", EventParam::Int(20))
            .with_param("scale", EventParam::Float(1.5))
            .with_param("school", EventParam::String("fire".to_string()));
        timeline.add_clip(events, Clip::new("done", 1.2, 0.0, event)).unwrap();
        timeline
    }

    #[test]
    fn test_round_trip_reproduces_graph() {
        let timeline = fireball();
        let text = export(&timeline, &manifest()).unwrap();
        let imported = import(&text, &manifest()).unwrap();
        assert!(imported.is_fully_resolved());

        // The audio ref had no identity before export; everything else is equal.
        let mut expected = timeline.clone();
        expected.for_each_clip_mut(|_, clip| {
            for (_, asset) in clip.asset_refs_mut() {
                if asset.handle() == Some(AssetHandle(2)) {
                    asset.identity = Some("sfx/whoosh".to_string());
                }
            }
        });
        assert_eq!(imported.timeline, expected);
    }

    #[test]
    fn test_exported_text_uses_identities() {
        let text = export(&fireball(), &manifest()).unwrap();
        assert!(text.contains("\"fx/fireball\""));
        assert!(text.contains("\"sfx/whoosh\""));
        assert!(text.contains("cast_finished"));
    }

    #[test]
    fn test_unresolved_reference_is_not_fatal() {
        let text = export(&fireball(), &manifest()).unwrap();
        let mut partial = manifest();
        partial.remove("fx/fireball");

        let imported = import(&text, &partial).unwrap();
        assert_eq!(imported.unresolved.len(), 1);
        assert_eq!(imported.unresolved[0].identity, "fx/fireball");
        assert_eq!(imported.unresolved[0].kind, AssetKind::Effect);

        let (_, clip) = imported
            .timeline
            .find_clip(imported.unresolved[0].clip)
            .unwrap();
        let glow = clip.data::<VfxClip>().unwrap();
        assert!(!glow.effect.is_resolved());
        assert_eq!(glow.effect.identity.as_deref(), Some("fx/fireball"));

        // Once the asset shows up, resolving again fills the handle in.
        let mut timeline = imported.timeline;
        assert!(resolve_references(&mut timeline, &manifest()).is_empty());
    }

    #[test]
    fn test_kind_mismatch_does_not_resolve() {
        let manifest = AssetManifest::new().with("fx/fireball", AssetKind::Audio, AssetHandle(3));
        assert_eq!(manifest.resolve(AssetKind::Effect, "fx/fireball"), None);
        assert_eq!(manifest.resolve(AssetKind::Audio, "fx/fireball"), Some(AssetHandle(3)));
    }

    #[test]
    fn test_import_rejects_overlap() {
        let mut timeline = Timeline::new("Broken");
        let group = timeline.add_group(Group::new("Main"));
        let fx = timeline
            .add_track(group, Track::new("FX", TrackKind::Vfx))
            .unwrap();
        timeline
            .add_clip(fx, Clip::new("a", 0.0, 1.0, VfxClip::default()))
            .unwrap();
        timeline
            .add_clip(fx, Clip::new("b", 1.0, 1.0, VfxClip::default()))
            .unwrap();
        let text = export(&timeline, &manifest()).unwrap();
        let forged = text.replacen("start: 1.0", "start: 0.5", 1);
        assert_ne!(forged, text);
        assert!(matches!(
            import(&forged, &manifest()),
            Err(TimelineError::Validation(_))
        ));
    }

    #[test]
    fn test_import_rejects_newer_format() {
        let text = export(&fireball(), &manifest()).unwrap();
        let newer = text.replacen("format_version: 1", "format_version: 99", 1);
        assert!(matches!(
            import(&newer, &manifest()),
            Err(TimelineError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_export_refreshes_duration() {
        let mut timeline = fireball();
        timeline.duration = 0.1;
        let text = export(&timeline, &manifest()).unwrap();
        let imported = import(&text, &manifest()).unwrap();
        assert_eq!(imported.timeline.duration, 1.2);
    }

    #[test]
    fn test_round_trip_keeps_trailing_duration() {
        let mut timeline = Timeline::new("Pulse").with_looping(true);
        let group = timeline.add_group(Group::new("Main"));
        let sfx = timeline
            .add_track(group, Track::new("SFX", TrackKind::Audio))
            .unwrap();
        timeline
            .add_clip(sfx, Clip::new("beep", 0.0, 0.5, AudioClip::default()))
            .unwrap();
        timeline.set_duration(2.0);
        timeline.validate().unwrap();

        let text = export(&timeline, &AssetManifest::new()).unwrap();
        let imported = import(&text, &AssetManifest::new()).unwrap();
        assert_eq!(imported.timeline.duration, 2.0);
        assert_eq!(imported.timeline, timeline);
    }
}
