// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip handlers and their lifecycle.
//!
//! A handler implements [`ClipProcess`] for exactly one payload type. The
//! runner only ever sees handlers through an erased wrapper that narrows the
//! clip payload to the handler's type before each callback, so handlers work
//! with their own data and never match on the payload enum.
//!
//! Per activation an instance goes through:
//!
//! ```text
//! Pooled -> on_enable -> Ready -> on_enter -> Active -> on_update* -> on_exit
//!        -> Finished -> on_disable -> reset -> Pooled
//! ```

use crate::context::{CleanupToken, ProcessContext};
use crate::error::{ProcessError, ProcessResult, RegistryError};
use crate::registry::{PlayMode, ProcessRegistry};
use crate::services::Capability;
use ordoplay_ability_timeline::{Clip, ClipData, ClipKind, TrackId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Behavior driven by one active clip
pub trait ClipProcess: Default + Send + 'static {
    /// Payload type this handler reads
    type Data: ClipData;

    /// Called when the instance is checked out of the pool
    fn on_enable(&mut self, _context: &mut ProcessContext) {}

    /// Called once when the clip window is entered
    ///
    /// Enter, update and exit should report problems through `Err`. A panic
    /// in one of them is caught and handled like an `Err`, but whatever the
    /// handler was doing is left half done.
    fn on_enter(&mut self, scope: &mut ClipScope<'_, Self::Data>) -> ProcessResult;

    /// Called every tick while active, including the entry tick
    fn on_update(&mut self, _scope: &mut ClipScope<'_, Self::Data>, _delta: f32) -> ProcessResult {
        Ok(())
    }

    /// Called once when the window is left, naturally or by interruption
    fn on_exit(&mut self, scope: &mut ClipScope<'_, Self::Data>) -> ProcessResult;

    /// Called before the instance goes back to the pool
    fn on_disable(&mut self, _context: &mut ProcessContext) {}

    /// Clear handler state; the instance's own bookkeeping is reset separately
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything a handler sees during one callback
pub struct ClipScope<'a, D> {
    /// Clip being played
    pub clip: &'a Clip,
    /// Typed payload of the clip
    pub data: &'a D,
    /// Track owning the clip
    pub track: TrackId,
    /// Timeline time of the callback
    pub time: f32,
    /// Session context
    pub context: &'a mut ProcessContext,
    instance: InstanceId,
}

impl<D> ClipScope<'_, D> {
    /// Instance running this callback
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Time elapsed inside the clip window
    pub fn local_time(&self) -> f32 {
        self.clip.local_time(self.time)
    }

    /// Normalized progress through the clip window
    pub fn progress(&self) -> f32 {
        self.clip.progress(self.time)
    }

    /// Look up a capability through the context
    pub fn service<C: Capability + ?Sized>(&mut self) -> Option<Arc<C>> {
        self.context.service::<C>()
    }

    /// Register an action that runs when this instance exits or the session ends
    pub fn on_cleanup(&mut self, action: impl FnOnce() + Send + 'static) -> CleanupToken {
        self.context.register_cleanup(Some(self.instance), Box::new(action))
    }
}

/// Identifier of a handler instance within one runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

/// Clip a callback is about
#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub clip: &'a Clip,
    pub track: TrackId,
    pub time: f32,
}

/// Object-safe face of a [`ClipProcess`]
pub(crate) trait ErasedProcess: Send {
    fn on_enable(&mut self, context: &mut ProcessContext);
    fn on_enter(&mut self, frame: Frame<'_>, instance: InstanceId, context: &mut ProcessContext) -> ProcessResult;
    fn on_update(
        &mut self,
        frame: Frame<'_>,
        instance: InstanceId,
        delta: f32,
        context: &mut ProcessContext,
    ) -> ProcessResult;
    fn on_exit(&mut self, frame: Frame<'_>, instance: InstanceId, context: &mut ProcessContext) -> ProcessResult;
    fn on_disable(&mut self, context: &mut ProcessContext);
    fn reset(&mut self);
}

/// Run a handler callback, turning a panic into a [`ProcessError::Panicked`]
fn guarded(callback: impl FnOnce() -> ProcessResult) -> ProcessResult {
    std::panic::catch_unwind(AssertUnwindSafe(callback))
        .unwrap_or_else(|payload| Err(ProcessError::from_panic(payload)))
}

/// A handler bound to its payload type
pub(crate) struct Bound<P>(P);

impl<P: ClipProcess> Bound<P> {
    pub(crate) fn new(process: P) -> Self {
        Self(process)
    }

    fn scope<'a>(
        frame: Frame<'a>,
        instance: InstanceId,
        context: &'a mut ProcessContext,
    ) -> Result<ClipScope<'a, P::Data>, ProcessError> {
        let data = P::Data::narrow(&frame.clip.payload).ok_or(ProcessError::KindMismatch {
            expected: P::Data::KIND,
            found: frame.clip.kind(),
        })?;
        Ok(ClipScope {
            clip: frame.clip,
            data,
            track: frame.track,
            time: frame.time,
            context,
            instance,
        })
    }
}

impl<P: ClipProcess> ErasedProcess for Bound<P> {
    fn on_enable(&mut self, context: &mut ProcessContext) {
        self.0.on_enable(context);
    }

    fn on_enter(&mut self, frame: Frame<'_>, instance: InstanceId, context: &mut ProcessContext) -> ProcessResult {
        let mut scope = Self::scope(frame, instance, context)?;
        guarded(|| self.0.on_enter(&mut scope))
    }

    fn on_update(
        &mut self,
        frame: Frame<'_>,
        instance: InstanceId,
        delta: f32,
        context: &mut ProcessContext,
    ) -> ProcessResult {
        let mut scope = Self::scope(frame, instance, context)?;
        guarded(|| self.0.on_update(&mut scope, delta))
    }

    fn on_exit(&mut self, frame: Frame<'_>, instance: InstanceId, context: &mut ProcessContext) -> ProcessResult {
        let mut scope = Self::scope(frame, instance, context)?;
        guarded(|| self.0.on_exit(&mut scope))
    }

    fn on_disable(&mut self, context: &mut ProcessContext) {
        self.0.on_disable(context);
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

/// Lifecycle state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Idle in the reuse pool
    Pooled,
    /// Checked out, waiting for its clip to be entered
    Ready,
    /// Clip window is active
    Active,
    /// Clip window was left, waiting to go back to the pool
    Finished,
}

impl ProcessState {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pooled => "Pooled",
            Self::Ready => "Ready",
            Self::Active => "Active",
            Self::Finished => "Finished",
        }
    }
}

/// A handler plus the lifecycle bookkeeping shared by every kind
pub(crate) struct ProcessInstance {
    id: InstanceId,
    kind: ClipKind,
    mode: PlayMode,
    handler: &'static str,
    state: ProcessState,
    process: Box<dyn ErasedProcess>,
}

impl ProcessInstance {
    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    pub(crate) fn handler(&self) -> &'static str {
        self.handler
    }

    pub(crate) fn state(&self) -> ProcessState {
        self.state
    }

    pub(crate) fn enable(&mut self, context: &mut ProcessContext) {
        if self.state == ProcessState::Pooled {
            self.process.on_enable(context);
            self.state = ProcessState::Ready;
        }
    }

    pub(crate) fn enter(&mut self, frame: Frame<'_>, context: &mut ProcessContext) -> ProcessResult {
        if self.state != ProcessState::Ready {
            return Err(self.invalid("enter"));
        }
        // Active before the callback so a failed enter is still exited.
        self.state = ProcessState::Active;
        self.process.on_enter(frame, self.id, context)
    }

    pub(crate) fn update(&mut self, frame: Frame<'_>, delta: f32, context: &mut ProcessContext) -> ProcessResult {
        if self.state != ProcessState::Active {
            return Err(self.invalid("update"));
        }
        self.process.on_update(frame, self.id, delta, context)
    }

    /// Exit the clip; a no-op unless active
    pub(crate) fn exit(&mut self, frame: Frame<'_>, context: &mut ProcessContext) -> ProcessResult {
        if self.state != ProcessState::Active {
            return Ok(());
        }
        self.state = ProcessState::Finished;
        let result = self.process.on_exit(frame, self.id, context);
        context.run_cleanups(self.id);
        result
    }

    pub(crate) fn disable(&mut self, context: &mut ProcessContext) {
        if self.state != ProcessState::Pooled {
            self.process.on_disable(context);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.process.reset();
        self.state = ProcessState::Pooled;
    }

    fn invalid(&self, operation: &'static str) -> ProcessError {
        ProcessError::InvalidState {
            state: self.state.name(),
            operation,
        }
    }
}

/// Reuse pool of handler instances keyed by (kind, mode)
#[derive(Default)]
pub(crate) struct ProcessPool {
    idle: HashMap<(ClipKind, PlayMode), Vec<ProcessInstance>>,
    next_id: u64,
    created: usize,
}

impl ProcessPool {
    /// Take an idle instance or create one from the registry
    pub(crate) fn checkout(
        &mut self,
        registry: &ProcessRegistry,
        kind: ClipKind,
        mode: PlayMode,
    ) -> Result<ProcessInstance, RegistryError> {
        if let Some(instance) = self.idle.get_mut(&(kind, mode)).and_then(Vec::pop) {
            return Ok(instance);
        }

        let registration = registry.resolve(kind, mode)?;
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        tracing::trace!("Created {} instance {:?}", registration.handler, id);

        Ok(ProcessInstance {
            id,
            kind,
            mode,
            handler: registration.handler,
            state: ProcessState::Pooled,
            process: (registration.factory)(),
        })
    }

    /// Return a reset instance
    pub(crate) fn checkin(&mut self, instance: ProcessInstance) {
        debug_assert_eq!(instance.state(), ProcessState::Pooled);
        self.idle
            .entry((instance.kind, instance.mode))
            .or_default()
            .push(instance);
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.idle.values().map(Vec::len).sum()
    }

    pub(crate) fn created_count(&self) -> usize {
        self.created
    }
}
