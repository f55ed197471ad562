// SPDX-License-Identifier: MIT OR Apache-2.0

use super::place;
use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::{ActorId, ActorRig, ProjectileHandle, SpawnRequest, Spawner};
use ordoplay_ability_timeline::SpawnClip;
use std::sync::Arc;

/// Spawns a prefab on enter; attached spawns are destroyed on exit
#[derive(Default)]
pub struct SpawnProcess {
    spawner: Option<Arc<dyn Spawner>>,
    spawned: Option<ProjectileHandle>,
}

impl ClipProcess for SpawnProcess {
    type Data = SpawnClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, SpawnClip>) -> ProcessResult {
        let Some(spawner) = scope.service::<dyn Spawner>() else {
            return Ok(());
        };
        let Some(prefab) = scope.data.prefab.handle() else {
            tracing::warn!("Spawn clip '{}' has no resolved prefab", scope.clip.name);
            return Ok(());
        };
        let rig = scope.service::<dyn ActorRig>();
        let data = scope.data;
        let owner = rig.as_ref().map_or(ActorId::default(), |r| r.actor());

        let request = SpawnRequest {
            prefab,
            transform: place(rig.as_ref(), &data.attachment),
            detach: data.detach,
            parent: (!data.detach).then_some(owner),
            event_tag: data.event_tag.clone(),
            target_tags: data.target_tags.clone(),
            owner,
        };

        match spawner.spawn(request) {
            Some(handle) if !data.detach => self.spawned = Some(handle),
            Some(_) => {}
            None => tracing::debug!("Spawner refused '{}'", scope.clip.name),
        }
        self.spawner = Some(spawner);
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, SpawnClip>) -> ProcessResult {
        if let (Some(spawner), Some(spawned)) = (self.spawner.take(), self.spawned.take()) {
            spawner.destroy(spawned);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::PlayMode;
    use crate::testing::play_clip;
    use ordoplay_ability_timeline::{AssetHandle, AssetRef, Clip, SpawnClip, TrackKind};

    fn arrow(detach: bool) -> Clip {
        let data = SpawnClip {
            prefab: AssetRef::resolved("prefab/arrow", AssetHandle(5)),
            detach,
            ..SpawnClip::default()
        };
        Clip::new("arrow", 0.1, 0.5, data)
    }

    #[test]
    fn test_attached_spawn_is_destroyed() {
        let recorder = play_clip(TrackKind::Spawn, arrow(false), PlayMode::Runtime, &[0.2, 0.5]);
        let spawned = recorder.events_with("spawn");
        assert_eq!(spawned.len(), 1);
        assert!(spawned[0].ends_with("parent=true"));
        assert_eq!(recorder.events_with("destroy").len(), 1);
    }

    #[test]
    fn test_detached_spawn_outlives_clip() {
        let recorder = play_clip(TrackKind::Spawn, arrow(true), PlayMode::Runtime, &[0.2, 0.5]);
        let spawned = recorder.events_with("spawn");
        assert_eq!(spawned.len(), 1);
        assert!(spawned[0].ends_with("parent=false"));
        assert!(recorder.events_with("destroy").is_empty());
    }
}
