// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stand-in game services that log what an ability asks of the game.

use ordoplay_ability_runtime::{
    ActorId, ActorRig, AnimationHandle, AnimationRequest, Animator, AudioPool, CameraCue,
    CameraRig, CharacterMotor, CombatSink, DebugDraw, EffectPool, EventSink, HitWindow,
    HitWindowId, ProjectileHandle, ServiceTable, SpawnRequest, Spawner, Transform,
};
use ordoplay_ability_timeline::{BindPoint, ClipId, EventClip, HitShape};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Height of the stand-in skeleton's upper body bones
const BONE_HEIGHT: f32 = 1.5;

/// What the stand-in services saw during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceLog {
    /// Animation layers started
    pub animations: u32,
    /// Objects spawned
    pub spawned: u32,
    /// Objects destroyed
    pub destroyed: u32,
    /// Hit windows opened
    pub hit_windows: u32,
    /// Events dispatched
    pub events: Vec<String>,
    /// Accumulated character displacement
    pub displacement: [f32; 3],
}

/// Logging implementation of every runtime capability
pub struct LoggingServices {
    actor: ActorId,
    log: Mutex<ServiceLog>,
    next_handle: AtomicU64,
    audio: Arc<AudioPool>,
    effects: Arc<EffectPool>,
}

impl LoggingServices {
    /// Services for one actor with fresh pools
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            log: Mutex::new(ServiceLog::default()),
            next_handle: AtomicU64::new(1),
            audio: Arc::new(AudioPool::new("audio")),
            effects: Arc::new(EffectPool::new("effects")),
        }
    }

    /// Provider exposing every capability
    pub fn table(self: &Arc<Self>) -> ServiceTable {
        ServiceTable::new()
            .with::<dyn ActorRig>(self.clone())
            .with::<dyn Animator>(self.clone())
            .with::<dyn Spawner>(self.clone())
            .with::<dyn CharacterMotor>(self.clone())
            .with::<dyn CombatSink>(self.clone())
            .with::<dyn CameraRig>(self.clone())
            .with::<dyn EventSink>(self.clone())
            .with::<dyn DebugDraw>(self.clone())
            .with(self.audio.clone())
            .with(self.effects.clone())
    }

    /// Snapshot of the recorded activity
    pub fn log(&self) -> ServiceLog {
        self.log.lock().clone()
    }

    /// Audio voice pool
    pub fn audio(&self) -> &Arc<AudioPool> {
        &self.audio
    }

    /// Effect instance pool
    pub fn effects(&self) -> &Arc<EffectPool> {
        &self.effects
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl ActorRig for LoggingServices {
    fn actor(&self) -> ActorId {
        self.actor
    }

    fn bone(&self, bind_point: BindPoint, custom_name: &str) -> Option<Transform> {
        let height = match bind_point {
            BindPoint::Root | BindPoint::LeftFoot | BindPoint::RightFoot => 0.0,
            BindPoint::Custom if custom_name.is_empty() => return None,
            _ => BONE_HEIGHT,
        };
        Some(Transform::at([0.0, height, 0.0]))
    }
}

impl Animator for LoggingServices {
    fn play(&self, request: &AnimationRequest) -> AnimationHandle {
        let handle = AnimationHandle(self.next());
        self.log.lock().animations += 1;
        tracing::info!(
            "animation {:?} on layer {} ({:?}, x{:.2})",
            request.animation,
            request.layer,
            request.blend_mode,
            request.speed
        );
        handle
    }

    fn set_weight(&self, handle: AnimationHandle, weight: f32) {
        tracing::trace!("animation {:?} weight {weight:.2}", handle);
    }

    fn sample(&self, handle: AnimationHandle, time: f32) {
        tracing::trace!("animation {:?} sampled at {time:.3}s", handle);
    }

    fn stop(&self, handle: AnimationHandle) {
        tracing::debug!("animation {:?} stopped", handle);
    }
}

impl Spawner for LoggingServices {
    fn spawn(&self, request: SpawnRequest) -> Option<ProjectileHandle> {
        let handle = ProjectileHandle(self.next());
        self.log.lock().spawned += 1;
        tracing::info!(
            "spawn {:?} as {:?} at {:?}{}",
            request.prefab,
            handle,
            request.transform.position,
            if request.detach { " (detached)" } else { "" }
        );
        Some(handle)
    }

    fn destroy(&self, handle: ProjectileHandle) {
        self.log.lock().destroyed += 1;
        tracing::debug!("destroy {:?}", handle);
    }
}

impl CharacterMotor for LoggingServices {
    fn translate(&self, delta: [f32; 3], _local_space: bool) {
        let mut log = self.log.lock();
        for (axis, d) in log.displacement.iter_mut().zip(delta) {
            *axis += d;
        }
    }
}

impl CombatSink for LoggingServices {
    fn open_window(&self, window: HitWindow) -> HitWindowId {
        let id = HitWindowId(self.next());
        self.log.lock().hit_windows += 1;
        tracing::info!(
            "hit window {:?} for {} damage ({:?})",
            id,
            window.damage,
            window.shape
        );
        id
    }

    fn update_window(&self, id: HitWindowId, transform: Transform) {
        tracing::trace!("hit window {:?} at {:?}", id, transform.position);
    }

    fn close_window(&self, id: HitWindowId) {
        tracing::debug!("hit window {:?} closed", id);
    }
}

impl CameraRig for LoggingServices {
    fn apply(&self, source: ClipId, cue: CameraCue) {
        tracing::trace!("camera cue from {:?} at weight {:.2}", source, cue.weight);
    }

    fn release(&self, source: ClipId) {
        tracing::debug!("camera cue from {:?} released", source);
    }
}

impl EventSink for LoggingServices {
    fn dispatch(&self, event: &EventClip, time: f32) {
        tracing::info!("event '{}' at {time:.3}s", event.name);
        self.log.lock().events.push(event.name.clone());
    }
}

impl DebugDraw for LoggingServices {
    fn hit_shape(&self, shape: &HitShape, transform: Transform) {
        tracing::trace!("draw {:?} at {:?}", shape, transform.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_ability_runtime::{ServiceKind, ServiceProvider};

    #[test]
    fn test_table_provides_everything() {
        let services = Arc::new(LoggingServices::new(ActorId(1)));
        let table = services.table();
        assert_eq!(table.len(), 10);
        assert!(table.provide(ServiceKind::EffectPool).is_some());
    }

    #[test]
    fn test_bone_heights() {
        let services = LoggingServices::new(ActorId(1));
        assert_eq!(services.bone(BindPoint::Root, ""), Some(Transform::IDENTITY));
        assert_eq!(services.bone(BindPoint::RightHand, "").map(|t| t.position[1]), Some(BONE_HEIGHT));
        assert!(services.bone(BindPoint::Custom, "").is_none());
        assert!(services.bone(BindPoint::Custom, "tail_03").is_some());
    }

    #[test]
    fn test_events_are_recorded() {
        let services = LoggingServices::new(ActorId(1));
        services.dispatch(&EventClip::new("footstep"), 0.5);
        services.translate([1.0, 0.0, 0.5], true);
        let log = services.log();
        assert_eq!(log.events, vec!["footstep".to_string()]);
        assert_eq!(log.displacement, [1.0, 0.0, 0.5]);
    }
}
