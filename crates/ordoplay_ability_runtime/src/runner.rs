// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner: the per-session clip scheduler.
//!
//! The runner owns the play cursor. Each tick it works out which clips the
//! cursor moved into or out of and drives their handlers, always in the same
//! order:
//!
//! 1. exits, for live clips whose window no longer contains the cursor
//! 2. enters, for clips whose window now contains the cursor
//! 3. updates, for every live clip including the ones just entered
//!
//! Handler failures are contained per instance. The failing instance is
//! force-exited and pooled, the failure is logged and recorded, and the
//! rest of the timeline keeps playing.

use crate::context::ProcessContext;
use crate::error::{ProcessError, RegistryError, RunnerError};
use crate::process::{Frame, ProcessInstance, ProcessPool};
use crate::registry::ProcessRegistry;
use crate::services::ServiceProvider;
use crate::settings::RunnerSettings;
use indexmap::IndexMap;
use ordoplay_ability_timeline::{Clip, ClipId, Timeline, Track, TrackId};
use std::collections::HashSet;
use std::sync::Arc;


/// Playback state of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// No session, or the session finished
    #[default]
    Idle,
    /// Cursor advances on tick
    Playing,
    /// Cursor frozen, instances kept
    Paused,
}

/// Lifecycle callback that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPhase {
    /// `on_enter`
    Enter,
    /// `on_update`
    Update,
    /// `on_exit`
    Exit,
}

/// A handler failure caught by the runner
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessFailure {
    /// Failing clip
    pub clip: ClipId,
    /// Clip display name
    pub clip_name: String,
    /// Track of the clip
    pub track: TrackId,
    /// Track display name
    pub track_name: String,
    /// Handler type
    pub handler: &'static str,
    /// Callback that failed
    pub phase: ProcessPhase,
    /// Timeline time of the failure
    pub time: f32,
    /// Error returned by the handler
    pub error: ProcessError,
}

/// Lifetime counters of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunnerStats {
    /// Successful enters
    pub entered: u64,
    /// Exits, forced or natural
    pub exited: u64,
    /// Handler failures caught
    pub failed: u64,
}

struct ActiveClip {
    track: TrackId,
    instance: ProcessInstance,
}

/// Drives one timeline session
pub struct Runner {
    registry: Arc<ProcessRegistry>,
    context: ProcessContext,
    settings: RunnerSettings,
    state: RunnerState,
    timeline: Option<Arc<Timeline>>,
    cursor: f32,
    active: IndexMap<ClipId, ActiveClip>,
    /// Failed clips kept out until their window is left
    blocked: HashSet<ClipId>,
    disabled_tracks: HashSet<TrackId>,
    pool: ProcessPool,
    failures: Vec<ProcessFailure>,
    stats: RunnerStats,
}

impl Runner {
    /// Create an idle runner
    pub fn new(
        registry: Arc<ProcessRegistry>,
        services: Arc<dyn ServiceProvider>,
        settings: RunnerSettings,
    ) -> Self {
        let mut context = ProcessContext::new(services, settings.play_mode);
        context.set_global_play_speed(settings.initial_play_speed);

        Self {
            registry,
            context,
            settings,
            state: RunnerState::Idle,
            timeline: None,
            cursor: 0.0,
            active: IndexMap::new(),
            blocked: HashSet::new(),
            disabled_tracks: HashSet::new(),
            pool: ProcessPool::default(),
            failures: Vec::new(),
            stats: RunnerStats::default(),
        }
    }

    /// Start playing a timeline from the beginning
    ///
    /// A session already in progress is stopped first. Clips whose window
    /// contains time zero are entered immediately.
    pub fn play(&mut self, timeline: Arc<Timeline>) -> Result<(), RunnerError> {
        timeline.validate()?;
        let mode = self.context.play_mode();
        for (_, clip) in timeline.clips() {
            if !self.registry.contains(clip.kind(), mode) {
                return Err(RegistryError::NotFound {
                    kind: clip.kind(),
                    mode,
                }
                .into());
            }
        }

        if self.state != RunnerState::Idle {
            self.stop();
        }

        tracing::info!(
            "Playing '{}' ({:.2}s, {} clip(s), {})",
            timeline.name,
            timeline.duration,
            timeline.clip_count(),
            mode.name()
        );
        self.timeline = Some(timeline.clone());
        self.cursor = 0.0;
        self.blocked.clear();
        self.state = RunnerState::Playing;
        self.advance(&timeline, 0.0, 0.0, 0.0, true);
        Ok(())
    }

    /// Advance the cursor by `delta_time` scaled by the global play speed
    pub fn tick(&mut self, delta_time: f32) {
        if self.state != RunnerState::Playing {
            return;
        }
        let Some(timeline) = self.timeline.clone() else {
            return;
        };

        let mut delta = delta_time.max(0.0) * self.context.global_play_speed();
        if let Some(max) = self.settings.max_tick_delta {
            delta = delta.min(max.max(0.0));
        }
        if !delta.is_finite() {
            tracing::warn!("Ignoring non-finite tick delta {}", delta_time);
            return;
        }

        let prev = self.cursor;
        let next = prev + delta;
        let duration = timeline.duration;

        if next < duration {
            self.cursor = next;
            self.advance(&timeline, prev, next, delta, false);
        } else if timeline.looping && duration > 0.0 {
            self.cursor = duration;
            self.advance(&timeline, prev, duration, delta, false);

            let wrapped = next % duration;
            tracing::debug!("'{}' looped to {:.3}s", timeline.name, wrapped);
            self.blocked.clear();
            self.cursor = wrapped;
            self.advance(&timeline, 0.0, wrapped, delta, true);
        } else {
            self.cursor = duration.max(0.0);
            self.advance(&timeline, prev, self.cursor, delta, false);
            self.finish(&timeline);
        }
    }

    /// Freeze the cursor; returns `false` unless playing
    pub fn pause(&mut self) -> bool {
        if self.state == RunnerState::Playing {
            self.state = RunnerState::Paused;
            true
        } else {
            false
        }
    }

    /// Unfreeze the cursor; returns `false` unless paused
    pub fn resume(&mut self) -> bool {
        if self.state == RunnerState::Paused {
            self.state = RunnerState::Playing;
            true
        } else {
            false
        }
    }

    /// Jump to `time`, clamped to the timeline
    ///
    /// Clips the jump leaves are exited and clips it lands in are entered,
    /// then every live clip gets a zero-delta update at the new time.
    /// Instantaneous clips are only fired by natural advancement.
    pub fn seek(&mut self, time: f32) -> Result<(), RunnerError> {
        if self.state == RunnerState::Idle {
            return Err(RunnerError::NotActive(self.state));
        }
        let Some(timeline) = self.timeline.clone() else {
            return Err(RunnerError::NotActive(self.state));
        };

        let time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, timeline.duration.max(0.0))
        };
        tracing::debug!("Seek '{}' to {:.3}s", timeline.name, time);

        self.cursor = time;
        self.blocked.clear();
        self.exit_left(&timeline, time, None);
        self.enter_clips(&timeline, time, None, 0.0);
        self.update_active(&timeline, time, 0.0);
        Ok(())
    }

    /// Force every live clip out, release all instances and reset the cursor
    pub fn stop(&mut self) {
        if let Some(timeline) = self.timeline.clone() {
            self.exit_all(&timeline, self.cursor);
        }
        self.context.teardown();

        if self.state != RunnerState::Idle {
            tracing::info!("Stopped at {:.3}s", self.cursor);
        }
        self.state = RunnerState::Idle;
        self.cursor = 0.0;
        self.blocked.clear();
    }

    /// Mute or unmute a track at runtime
    ///
    /// Muting exits the track's live clips immediately, without a final update.
    pub fn set_track_enabled(&mut self, track_id: TrackId, enabled: bool) {
        if enabled {
            self.disabled_tracks.remove(&track_id);
            return;
        }
        if !self.disabled_tracks.insert(track_id) {
            return;
        }
        let Some(timeline) = self.timeline.clone() else {
            return;
        };

        let muted: Vec<ClipId> = self
            .active
            .iter()
            .filter(|(_, entry)| entry.track == track_id)
            .map(|(id, _)| *id)
            .collect();
        for clip_id in muted {
            if let Some(entry) = self.active.shift_remove(&clip_id) {
                self.retire(&timeline, clip_id, entry, None, self.cursor);
            }
        }
    }

    /// Whether a track is allowed to play
    pub fn is_track_enabled(&self, track_id: TrackId) -> bool {
        !self.disabled_tracks.contains(&track_id)
    }

    /// Current time-scale multiplier
    pub fn global_play_speed(&self) -> f32 {
        self.context.global_play_speed()
    }

    /// Set the time-scale multiplier; zero freezes handlers while ticks continue
    pub fn set_global_play_speed(&mut self, speed: f32) {
        self.context.set_global_play_speed(speed);
    }

    /// Current state
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Whether the cursor advances on tick
    pub fn is_playing(&self) -> bool {
        self.state == RunnerState::Playing
    }

    /// Current timeline time
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Cursor as a fraction of the timeline duration
    pub fn normalized_time(&self) -> f32 {
        match &self.timeline {
            Some(timeline) if timeline.duration > 0.0 => self.cursor / timeline.duration,
            _ => 0.0,
        }
    }

    /// Timeline of the current or last session
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.timeline.as_ref()
    }

    /// Clips with a live instance, in activation order
    pub fn active_clips(&self) -> Vec<ClipId> {
        self.active.keys().copied().collect()
    }

    /// Whether a clip has a live instance
    pub fn is_active(&self, clip_id: ClipId) -> bool {
        self.active.contains_key(&clip_id)
    }

    /// Failures caught so far
    pub fn failures(&self) -> &[ProcessFailure] {
        &self.failures
    }

    /// Drain the caught failures
    pub fn take_failures(&mut self) -> Vec<ProcessFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Enter, exit and failure counts over the runner's lifetime
    pub fn stats(&self) -> RunnerStats {
        self.stats
    }

    /// Instances idle in the reuse pool
    pub fn pooled_instances(&self) -> usize {
        self.pool.idle_count()
    }

    /// Instances created over the runner's lifetime
    pub fn created_instances(&self) -> usize {
        self.pool.created_count()
    }

    /// Session settings
    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Handler registry
    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Session context
    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    /// Mutable session context
    pub fn context_mut(&mut self) -> &mut ProcessContext {
        &mut self.context
    }

    /// Natural advancement from `from` to `to`
    fn advance(&mut self, timeline: &Timeline, from: f32, to: f32, delta: f32, fresh_pass: bool) {
        self.exit_left(timeline, to, Some(delta));
        self.blocked
            .retain(|id| timeline.find_clip(*id).is_some_and(|(_, clip)| clip.contains(to)));
        self.enter_clips(timeline, to, Some((from, fresh_pass)), delta);
        self.update_active(timeline, to, delta);
    }

    fn finish(&mut self, timeline: &Timeline) {
        self.exit_all(timeline, self.cursor);
        self.context.teardown();
        self.state = RunnerState::Idle;
        tracing::info!("Finished '{}' at {:.3}s", timeline.name, self.cursor);
    }

    fn plays(&self, track: &Track) -> bool {
        track.enabled && !self.disabled_tracks.contains(&track.id)
    }

    fn is_live_at(&self, timeline: &Timeline, track_id: TrackId, clip_id: ClipId, time: f32) -> bool {
        find(timeline, track_id, clip_id)
            .is_some_and(|(track, clip)| self.plays(track) && clip.enabled && clip.contains(time))
    }

    /// Exit live clips whose window does not contain `time`
    ///
    /// With `final_delta`, each exit is preceded by a last update.
    fn exit_left(&mut self, timeline: &Timeline, time: f32, final_delta: Option<f32>) {
        let leaving: Vec<ClipId> = self
            .active
            .iter()
            .filter(|(id, entry)| !self.is_live_at(timeline, entry.track, **id, time))
            .map(|(id, _)| *id)
            .collect();

        for clip_id in leaving {
            if let Some(entry) = self.active.shift_remove(&clip_id) {
                self.retire(timeline, clip_id, entry, final_delta, time);
            }
        }
    }

    fn exit_all(&mut self, timeline: &Timeline, time: f32) {
        while let Some((clip_id, entry)) = self.active.shift_remove_index(0) {
            self.retire(timeline, clip_id, entry, None, time);
        }
    }

    /// Enter clips whose window contains `time`
    ///
    /// `sweep` carries the start of a natural advancement; instantaneous
    /// clips whose start it crossed fire within this call.
    fn enter_clips(&mut self, timeline: &Timeline, time: f32, sweep: Option<(f32, bool)>, delta: f32) {
        for track in timeline.tracks() {
            if !self.plays(track) {
                continue;
            }
            for clip in track.clips().iter().filter(|c| c.enabled) {
                if clip.is_instant() {
                    let crossed = sweep.is_some_and(|(from, fresh_pass)| {
                        (from < clip.start && clip.start <= time) || (fresh_pass && clip.start == from)
                    });
                    if crossed {
                        self.fire_instant(track, clip, delta);
                    }
                } else if clip.contains(time)
                    && !self.active.contains_key(&clip.id)
                    && !self.blocked.contains(&clip.id)
                {
                    if let Some(instance) = self.enter(track, clip, time) {
                        self.active.insert(
                            clip.id,
                            ActiveClip {
                                track: track.id,
                                instance,
                            },
                        );
                    }
                }
            }
        }
    }

    /// Check out an instance and enter it; on failure it is exited and pooled again
    fn enter(&mut self, track: &Track, clip: &Clip, time: f32) -> Option<ProcessInstance> {
        let mode = self.context.play_mode();
        let mut instance = match self.pool.checkout(&self.registry, clip.kind(), mode) {
            Ok(instance) => instance,
            Err(err) => {
                let error = ProcessError::failed(err.to_string());
                self.report(track, clip, "<unregistered>", ProcessPhase::Enter, time, error);
                self.block(clip);
                return None;
            }
        };

        instance.enable(&mut self.context);
        let frame = Frame {
            clip,
            track: track.id,
            time,
        };
        match instance.enter(frame, &mut self.context) {
            Ok(()) => {
                self.stats.entered += 1;
                tracing::debug!(
                    "Entered '{}' on '{}' at {:.3}s ({:?})",
                    clip.name,
                    track.name,
                    time,
                    instance.id()
                );
                Some(instance)
            }
            Err(error) => {
                let handler = instance.handler();
                self.report(track, clip, handler, ProcessPhase::Enter, time, error);
                self.stats.exited += 1;
                if let Err(error) = instance.exit(frame, &mut self.context) {
                    self.report(track, clip, handler, ProcessPhase::Exit, time, error);
                }
                self.release(instance);
                self.block(clip);
                None
            }
        }
    }

    fn fire_instant(&mut self, track: &Track, clip: &Clip, delta: f32) {
        let time = clip.start;
        let Some(mut instance) = self.enter(track, clip, time) else {
            return;
        };

        let handler = instance.handler();
        let frame = Frame {
            clip,
            track: track.id,
            time,
        };
        if let Err(error) = instance.update(frame, delta, &mut self.context) {
            self.report(track, clip, handler, ProcessPhase::Update, time, error);
        }
        self.stats.exited += 1;
        if let Err(error) = instance.exit(frame, &mut self.context) {
            self.report(track, clip, handler, ProcessPhase::Exit, time, error);
        }
        self.release(instance);
    }

    fn update_active(&mut self, timeline: &Timeline, time: f32, delta: f32) {
        let mut failed = Vec::new();
        for (clip_id, entry) in self.active.iter_mut() {
            let Some((_, clip)) = find(timeline, entry.track, *clip_id) else {
                continue;
            };
            let frame = Frame {
                clip,
                track: entry.track,
                time,
            };
            if let Err(error) = entry.instance.update(frame, delta, &mut self.context) {
                failed.push((*clip_id, error));
            }
        }

        for (clip_id, error) in failed {
            let Some(entry) = self.active.shift_remove(&clip_id) else {
                continue;
            };
            if let Some((track, clip)) = find(timeline, entry.track, clip_id) {
                self.report(track, clip, entry.instance.handler(), ProcessPhase::Update, time, error);
                self.block(clip);
            }
            self.retire(timeline, clip_id, entry, None, time);
        }
    }

    /// Exit a live clip and return its instance to the pool
    fn retire(
        &mut self,
        timeline: &Timeline,
        clip_id: ClipId,
        mut entry: ActiveClip,
        final_delta: Option<f32>,
        time: f32,
    ) {
        if let Some((track, clip)) = find(timeline, entry.track, clip_id) {
            let handler = entry.instance.handler();
            let time = match final_delta {
                Some(_) => time.min(clip.end()),
                None => time,
            };
            let frame = Frame {
                clip,
                track: track.id,
                time,
            };

            if let Some(delta) = final_delta {
                if let Err(error) = entry.instance.update(frame, delta, &mut self.context) {
                    self.report(track, clip, handler, ProcessPhase::Update, time, error);
                }
            }
            self.stats.exited += 1;
            match entry.instance.exit(frame, &mut self.context) {
                Ok(()) => tracing::debug!("Exited '{}' on '{}' at {:.3}s", clip.name, track.name, time),
                Err(error) => self.report(track, clip, handler, ProcessPhase::Exit, time, error),
            }
        }
        self.release(entry.instance);
    }

    fn release(&mut self, mut instance: ProcessInstance) {
        instance.disable(&mut self.context);
        instance.reset();
        self.pool.checkin(instance);
    }

    fn block(&mut self, clip: &Clip) {
        if !self.settings.reenter_failed_clips && !clip.is_instant() {
            self.blocked.insert(clip.id);
        }
    }

    fn report(
        &mut self,
        track: &Track,
        clip: &Clip,
        handler: &'static str,
        phase: ProcessPhase,
        time: f32,
        error: ProcessError,
    ) {
        tracing::error!(
            "{} failed in {:?} for clip '{}' on track '{}' at {:.3}s: {}",
            handler,
            phase,
            clip.name,
            track.name,
            time,
            error
        );
        self.stats.failed += 1;
        self.failures.push(ProcessFailure {
            clip: clip.id,
            clip_name: clip.name.clone(),
            track: track.id,
            track_name: track.name.clone(),
            handler,
            phase,
            time,
            error,
        });
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn find(timeline: &Timeline, track_id: TrackId, clip_id: ClipId) -> Option<(&Track, &Clip)> {
    let track = timeline.track(track_id)?;
    Some((track, track.clip(clip_id)?))
}
