// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording handlers and services shared by the unit tests.

use crate::error::{ProcessError, ProcessResult};
use crate::pool::{AudioPool, EffectPool};
use crate::process::{ClipProcess, ClipScope};
use crate::registry::{PlayMode, ProcessRegistry, ProcessRegistryBuilder};
use crate::services::{
    ActorId, ActorRig, AnimationHandle, AnimationRequest, Animator, CameraCue, CameraRig,
    CharacterMotor, CombatSink, DebugDraw, EventSink, HitWindow, HitWindowId, ProjectileHandle,
    ServiceTable, SpawnRequest, Spawner, Transform,
};
use crate::context::ProcessContext;
use crate::runner::Runner;
use crate::settings::RunnerSettings;
use ordoplay_ability_timeline::{
    AnimationClip, AudioClip, BindPoint, CameraClip, Clip, ClipData, ClipId, DamageClip,
    EventClip, Group, HitShape, MovementClip, SpawnClip, Timeline, Track, TrackKind, VfxClip,
};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One recorded handler callback
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Enable,
    Enter(String, f32),
    Update(String, f32, f32),
    Exit(String, f32),
    Disable,
}

/// Shared callback log
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub(crate) fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    /// Only the enter and exit calls
    pub(crate) fn transitions(&self) -> Vec<Call> {
        self.0
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Enter(..) | Call::Exit(..)))
            .cloned()
            .collect()
    }

    /// Enter/exit calls as `"+name"` / `"-name"`
    pub(crate) fn script(&self) -> Vec<String> {
        self.transitions()
            .into_iter()
            .filter_map(|c| match c {
                Call::Enter(name, _) => Some(format!("+{name}")),
                Call::Exit(name, _) => Some(format!("-{name}")),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn updates_of(&self, clip: &str) -> Vec<(f32, f32)> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Update(name, time, delta) if name == clip => Some((*time, *delta)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().iter().filter(|c| f(c)).count()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Handler that logs every callback and fails on request
///
/// A clip whose name contains `fail_enter`, `fail_update` or `fail_exit`
/// makes the matching callback return an error; `panic_enter` and
/// `panic_update` make it panic instead.
pub(crate) struct RecordingProcess<D> {
    log: CallLog,
    _data: PhantomData<fn() -> D>,
}

impl<D> RecordingProcess<D> {
    pub(crate) fn new(log: CallLog) -> Self {
        Self {
            log,
            _data: PhantomData,
        }
    }
}

impl<D> Default for RecordingProcess<D> {
    fn default() -> Self {
        Self::new(CallLog::default())
    }
}

fn fail_if(name: &str, marker: &str) -> ProcessResult {
    let panic_marker = marker.replacen("fail", "panic", 1);
    if name.contains(&panic_marker) {
        panic!("{panic_marker} requested by {name}");
    }
    if name.contains(marker) {
        Err(ProcessError::failed(format!("{marker} requested by {name}")))
    } else {
        Ok(())
    }
}

impl<D: ClipData> ClipProcess for RecordingProcess<D> {
    type Data = D;

    fn on_enable(&mut self, _context: &mut ProcessContext) {
        self.log.push(Call::Enable);
    }

    fn on_enter(&mut self, scope: &mut ClipScope<'_, D>) -> ProcessResult {
        self.log.push(Call::Enter(scope.clip.name.clone(), scope.time));
        fail_if(&scope.clip.name, "fail_enter")
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, D>, delta: f32) -> ProcessResult {
        self.log
            .push(Call::Update(scope.clip.name.clone(), scope.time, delta));
        fail_if(&scope.clip.name, "fail_update")
    }

    fn on_exit(&mut self, scope: &mut ClipScope<'_, D>) -> ProcessResult {
        self.log.push(Call::Exit(scope.clip.name.clone(), scope.time));
        fail_if(&scope.clip.name, "fail_exit")
    }

    fn on_disable(&mut self, _context: &mut ProcessContext) {
        self.log.push(Call::Disable);
    }

    fn reset(&mut self) {}
}

fn register_recorder<D: ClipData>(builder: &mut ProcessRegistryBuilder, log: &CallLog) {
    let log = log.clone();
    builder
        .register_with(&PlayMode::ALL, move || RecordingProcess::<D>::new(log.clone()))
        .unwrap();
}

/// Registry with a recording handler for every kind and mode
pub(crate) fn recording_registry(log: &CallLog) -> ProcessRegistry {
    let mut builder = ProcessRegistry::builder();
    register_recorder::<AnimationClip>(&mut builder, log);
    register_recorder::<AudioClip>(&mut builder, log);
    register_recorder::<VfxClip>(&mut builder, log);
    register_recorder::<MovementClip>(&mut builder, log);
    register_recorder::<DamageClip>(&mut builder, log);
    register_recorder::<CameraClip>(&mut builder, log);
    register_recorder::<SpawnClip>(&mut builder, log);
    register_recorder::<EventClip>(&mut builder, log);
    builder.build()
}

/// Timeline with one track per entry, all in a single group
pub(crate) fn timeline_of(tracks: Vec<(TrackKind, Vec<Clip>)>) -> Timeline {
    let mut timeline = Timeline::new("test");
    let group = timeline.add_group(Group::new("main"));
    for (index, (kind, clips)) in tracks.into_iter().enumerate() {
        let track_id = timeline
            .add_track(group, Track::new(format!("track {index}"), kind))
            .unwrap();
        for clip in clips {
            timeline.add_clip(track_id, clip).unwrap();
        }
    }
    timeline
}

/// Play one clip through the built-in handlers, leaving the session running
pub(crate) fn play_clip_until(
    kind: TrackKind,
    clip: Clip,
    mode: PlayMode,
    steps: &[f32],
) -> (Runner, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let settings = RunnerSettings {
        play_mode: mode,
        ..RunnerSettings::default()
    };
    let mut runner = Runner::new(
        Arc::new(ProcessRegistry::builtin().unwrap()),
        Arc::new(recorder.table()),
        settings,
    );
    runner
        .play(Arc::new(timeline_of(vec![(kind, vec![clip])])))
        .unwrap();
    for &step in steps {
        runner.tick(step);
    }
    (runner, recorder)
}

/// Play one clip through the built-in handlers, then stop
pub(crate) fn play_clip(kind: TrackKind, clip: Clip, mode: PlayMode, steps: &[f32]) -> Arc<Recorder> {
    let (mut runner, recorder) = play_clip_until(kind, clip, mode, steps);
    runner.stop();
    recorder
}

/// Service stand-in that records every call
pub(crate) struct Recorder {
    events: Mutex<Vec<String>>,
    moved: Mutex<[f32; 3]>,
    next_id: AtomicU64,
    pub audio: Arc<AudioPool>,
    pub effects: Arc<EffectPool>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            moved: Mutex::new([0.0; 3]),
            next_id: AtomicU64::new(1),
            audio: Arc::new(AudioPool::new("audio")),
            effects: Arc::new(EffectPool::new("vfx")),
        }
    }
}

impl Recorder {
    /// Every capability backed by this recorder
    pub(crate) fn table(self: &Arc<Self>) -> ServiceTable {
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

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Recorded events starting with `prefix`
    pub(crate) fn events_with(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub(crate) fn moved(&self) -> [f32; 3] {
        *self.moved.lock()
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl ActorRig for Recorder {
    fn actor(&self) -> ActorId {
        ActorId(42)
    }

    fn bone(&self, bind_point: BindPoint, _custom_name: &str) -> Option<Transform> {
        match bind_point {
            BindPoint::Root => Some(Transform::IDENTITY),
            BindPoint::Custom => None,
            _ => Some(Transform::at([0.0, 1.0, 0.0])),
        }
    }
}

impl Animator for Recorder {
    fn play(&self, request: &AnimationRequest) -> AnimationHandle {
        self.record(format!("anim.play {} layer {}", request.animation.0, request.layer));
        AnimationHandle(self.next())
    }

    fn set_weight(&self, _handle: AnimationHandle, weight: f32) {
        self.record(format!("anim.weight {weight:.2}"));
    }

    fn sample(&self, _handle: AnimationHandle, time: f32) {
        self.record(format!("anim.sample {time:.2}"));
    }

    fn stop(&self, handle: AnimationHandle) {
        self.record(format!("anim.stop {}", handle.0));
    }
}

impl Spawner for Recorder {
    fn spawn(&self, request: SpawnRequest) -> Option<ProjectileHandle> {
        let handle = ProjectileHandle(self.next());
        self.record(format!(
            "spawn {} {} parent={}",
            request.prefab.0,
            handle.0,
            request.parent.is_some()
        ));
        Some(handle)
    }

    fn destroy(&self, handle: ProjectileHandle) {
        self.record(format!("destroy {}", handle.0));
    }
}

impl CharacterMotor for Recorder {
    fn translate(&self, delta: [f32; 3], _local_space: bool) {
        let mut moved = self.moved.lock();
        for (axis, d) in moved.iter_mut().zip(delta) {
            *axis += d;
        }
        self.record("move".to_string());
    }
}

impl CombatSink for Recorder {
    fn open_window(&self, window: HitWindow) -> HitWindowId {
        let id = HitWindowId(self.next());
        self.record(format!("hit.open {} {}", window.damage, id.0));
        id
    }

    fn update_window(&self, id: HitWindowId, _transform: Transform) {
        self.record(format!("hit.update {}", id.0));
    }

    fn close_window(&self, id: HitWindowId) {
        self.record(format!("hit.close {}", id.0));
    }
}

impl CameraRig for Recorder {
    fn apply(&self, _source: ClipId, cue: CameraCue) {
        self.record(format!("camera.apply {:.2}", cue.weight));
    }

    fn release(&self, _source: ClipId) {
        self.record("camera.release".to_string());
    }
}

impl EventSink for Recorder {
    fn dispatch(&self, event: &EventClip, time: f32) {
        self.record(format!("event {} {time:.2}", event.name));
    }
}

impl DebugDraw for Recorder {
    fn hit_shape(&self, _shape: &HitShape, _transform: Transform) {
        self.record("draw".to_string());
    }
}
