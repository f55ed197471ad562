// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-session state shared by every handler of one runner.

use crate::process::InstanceId;
use crate::registry::PlayMode;
use crate::services::{Capability, Service, ServiceKind, ServiceProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Token returned when a cleanup action is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CleanupToken(u64);

struct Cleanup {
    token: CleanupToken,
    owner: Option<InstanceId>,
    action: Box<dyn FnOnce() + Send>,
}

/// Shared session state: service lookup, global speed, scoped cleanup
///
/// Services are resolved through the injected provider the first time a
/// handler asks for them and cached for the rest of the session, including
/// a miss. Cleanup actions run exactly once: when their owning instance
/// exits, or when the session is torn down, whichever comes first.
pub struct ProcessContext {
    provider: Arc<dyn ServiceProvider>,
    cache: HashMap<ServiceKind, Option<Service>>,
    global_play_speed: f32,
    play_mode: PlayMode,
    cleanups: Vec<Cleanup>,
    next_token: u64,
}

impl ProcessContext {
    /// Create a context over a service provider
    pub fn new(provider: Arc<dyn ServiceProvider>, play_mode: PlayMode) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
            global_play_speed: 1.0,
            play_mode,
            cleanups: Vec::new(),
            next_token: 0,
        }
    }

    /// Look up a capability, `None` when the host does not provide it
    pub fn service<C: Capability + ?Sized>(&mut self) -> Option<Arc<C>> {
        let provider = &self.provider;
        let entry = self.cache.entry(C::KIND).or_insert_with(|| {
            let service = provider.provide(C::KIND);
            if service.is_none() {
                tracing::warn!("No {:?} service provided, feature disabled for this session", C::KIND);
            }
            service
        });
        entry.as_ref().and_then(C::extract)
    }

    /// Whether a capability is available
    pub fn has_service<C: Capability + ?Sized>(&mut self) -> bool {
        self.service::<C>().is_some()
    }

    /// Current time-scale multiplier
    pub fn global_play_speed(&self) -> f32 {
        self.global_play_speed
    }

    /// Set the time-scale multiplier; negative values clamp to zero
    pub fn set_global_play_speed(&mut self, speed: f32) {
        self.global_play_speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    }

    /// Play mode of the session
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Register a session-scoped cleanup action, run at teardown
    pub fn on_cleanup(&mut self, action: impl FnOnce() + Send + 'static) -> CleanupToken {
        self.register_cleanup(None, Box::new(action))
    }

    pub(crate) fn register_cleanup(
        &mut self,
        owner: Option<InstanceId>,
        action: Box<dyn FnOnce() + Send>,
    ) -> CleanupToken {
        let token = CleanupToken(self.next_token);
        self.next_token += 1;
        self.cleanups.push(Cleanup {
            token,
            owner,
            action,
        });
        token
    }

    /// Drop a pending cleanup action without running it
    pub fn cancel_cleanup(&mut self, token: CleanupToken) -> bool {
        let before = self.cleanups.len();
        self.cleanups.retain(|c| c.token != token);
        self.cleanups.len() != before
    }

    /// Number of cleanup actions still pending
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }

    /// Run and remove the actions owned by an exiting instance
    pub(crate) fn run_cleanups(&mut self, owner: InstanceId) -> usize {
        let (owned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.cleanups)
            .into_iter()
            .partition(|c| c.owner == Some(owner));
        self.cleanups = kept;
        run_all(owned)
    }

    /// Run every pending cleanup action and forget cached services
    pub fn teardown(&mut self) -> usize {
        let count = run_all(std::mem::take(&mut self.cleanups));
        self.cache.clear();
        if count > 0 {
            tracing::debug!("Context teardown ran {} cleanup action(s)", count);
        }
        count
    }
}

fn run_all(cleanups: Vec<Cleanup>) -> usize {
    let count = cleanups.len();
    // Last registered, first released.
    for cleanup in cleanups.into_iter().rev() {
        (cleanup.action)();
    }
    count
}

impl Drop for ProcessContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::AudioPool;
    use crate::services::{EventSink, ServiceTable};
    use crate::testing::Recorder;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        table: ServiceTable,
        calls: AtomicUsize,
    }

    impl ServiceProvider for CountingProvider {
        fn provide(&self, kind: ServiceKind) -> Option<Service> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table.provide(kind)
        }
    }

    fn context(table: ServiceTable) -> (ProcessContext, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            table,
            calls: AtomicUsize::new(0),
        });
        (ProcessContext::new(provider.clone(), PlayMode::Runtime), provider)
    }

    #[test]
    fn test_services_are_cached() {
        let table = ServiceTable::new().with::<dyn EventSink>(Arc::new(Recorder::default()));
        let (mut ctx, provider) = context(table);

        assert!(ctx.service::<dyn EventSink>().is_some());
        assert!(ctx.service::<dyn EventSink>().is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_service_is_none_and_cached() {
        let (mut ctx, provider) = context(ServiceTable::new());
        assert!(ctx.service::<AudioPool>().is_none());
        assert!(!ctx.has_service::<AudioPool>());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        ctx.teardown();
        assert!(ctx.service::<AudioPool>().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_play_speed_clamps() {
        let (mut ctx, _) = context(ServiceTable::new());
        ctx.set_global_play_speed(0.5);
        assert_eq!(ctx.global_play_speed(), 0.5);
        ctx.set_global_play_speed(-2.0);
        assert_eq!(ctx.global_play_speed(), 0.0);
        ctx.set_global_play_speed(f32::NAN);
        assert_eq!(ctx.global_play_speed(), 0.0);
    }

    #[test]
    fn test_owned_cleanups_run_once() {
        let (mut ctx, _) = context(ServiceTable::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let owner = InstanceId(7);

        let counter = hits.clone();
        ctx.register_cleanup(
            Some(owner),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        ctx.on_cleanup(|| {});

        assert_eq!(ctx.run_cleanups(owner), 1);
        assert_eq!(ctx.run_cleanups(owner), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.pending_cleanups(), 1);
        assert_eq!(ctx.teardown(), 1);
        assert_eq!(ctx.pending_cleanups(), 0);
    }

    #[test]
    fn test_teardown_runs_in_reverse_order() {
        let (mut ctx, _) = context(ServiceTable::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            ctx.on_cleanup(move || order.lock().push(i));
        }
        let cancelled = {
            let order = order.clone();
            ctx.on_cleanup(move || order.lock().push(99))
        };
        assert!(ctx.cancel_cleanup(cancelled));
        assert!(!ctx.cancel_cleanup(cancelled));

        ctx.teardown();
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn test_drop_runs_pending_cleanups() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let (mut ctx, _) = context(ServiceTable::new());
            let counter = hits.clone();
            ctx.on_cleanup(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
