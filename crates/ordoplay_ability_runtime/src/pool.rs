// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pools of transient audio voices and effect instances.
//!
//! Pools are owned by the embedding application and reach handlers through
//! the process context. Instances are keyed by the template asset they were
//! created from and reused across clips. Handles carry a generation so a
//! handle that was already released can never touch the instance's next
//! user: releasing it again is a quiet no-op.

use crate::services::Transform;
use ordoplay_ability_timeline::AssetHandle;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Object that can live in an [`InstancePool`]
pub trait Pooled: Send + 'static {
    /// Create a fresh instance for a template
    fn instantiate(template: AssetHandle) -> Self;

    /// Clear transient playback state before the instance goes idle
    fn reset(&mut self);
}

/// Handle to a checked-out pool instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    template: AssetHandle,
    generation: u32,
    live: bool,
    instance: T,
}

struct PoolInner<T> {
    slots: Vec<Slot<T>>,
    idle: HashMap<AssetHandle, Vec<u32>>,
}

/// Thread-safe pool of reusable instances keyed by template
pub struct InstancePool<T> {
    name: &'static str,
    inner: Mutex<PoolInner<T>>,
}

impl<T: Pooled> InstancePool<T> {
    /// Create an empty pool
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(PoolInner {
                slots: Vec::new(),
                idle: HashMap::new(),
            }),
        }
    }

    /// Pool name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check out an idle instance of `template`, creating one if none is idle
    pub fn acquire(&self, template: AssetHandle) -> PoolHandle {
        let mut inner = self.inner.lock();

        if let Some(index) = inner.idle.get_mut(&template).and_then(Vec::pop) {
            let slot = &mut inner.slots[index as usize];
            slot.live = true;
            return PoolHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = inner.slots.len() as u32;
        inner.slots.push(Slot {
            template,
            generation: 0,
            live: true,
            instance: T::instantiate(template),
        });
        tracing::trace!("{} pool created instance #{} for {:?}", self.name, index, template);
        PoolHandle {
            index,
            generation: 0,
        }
    }

    /// Return an instance to the idle set
    ///
    /// Returns `false` without doing anything when the handle is stale or was
    /// already released.
    pub fn release(&self, handle: PoolHandle) -> bool {
        let mut inner = self.inner.lock();
        let Some(slot) = inner.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.live || slot.generation != handle.generation {
            tracing::trace!("{} pool ignored release of stale handle {:?}", self.name, handle);
            return false;
        }

        slot.instance.reset();
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        let template = slot.template;
        inner.idle.entry(template).or_default().push(handle.index);
        true
    }

    /// Release every live instance, returning how many were live
    pub fn release_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let mut released = Vec::new();

        for (index, slot) in inner.slots.iter_mut().enumerate() {
            if slot.live {
                slot.instance.reset();
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                released.push((slot.template, index as u32));
            }
        }

        let count = released.len();
        for (template, index) in released {
            inner.idle.entry(template).or_default().push(index);
        }
        if count > 0 {
            tracing::debug!("{} pool released {} live instance(s)", self.name, count);
        }
        count
    }

    /// Run `f` against a live instance
    pub fn with_instance<R>(&self, handle: PoolHandle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        let slot = inner.slots.get_mut(handle.index as usize)?;
        if !slot.live || slot.generation != handle.generation {
            return None;
        }
        Some(f(&mut slot.instance))
    }

    /// Whether the handle still refers to a live instance
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.with_instance(handle, |_| ()).is_some()
    }

    /// Number of checked-out instances
    pub fn live_count(&self) -> usize {
        self.inner.lock().slots.iter().filter(|s| s.live).count()
    }

    /// Number of idle instances for a template
    pub fn idle_count(&self, template: AssetHandle) -> usize {
        self.inner.lock().idle.get(&template).map_or(0, Vec::len)
    }

    /// Number of instances ever created
    pub fn created_count(&self) -> usize {
        self.inner.lock().slots.len()
    }
}

/// Pool of audio voices
pub type AudioPool = InstancePool<AudioVoice>;

/// Pool of effect instances
pub type EffectPool = InstancePool<EffectInstance>;

/// A pooled audio voice; the audio backend mirrors this state
#[derive(Debug, Clone, PartialEq)]
pub struct AudioVoice {
    /// Audio asset this voice plays
    pub template: AssetHandle,
    /// Playback position in seconds
    pub position: f32,
    /// Volume (0..1)
    pub volume: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Loop playback
    pub looping: bool,
    /// Whether the voice is audible
    pub playing: bool,
}

impl AudioVoice {
    /// Start playback from the beginning
    pub fn play(&mut self, volume: f32, pitch: f32, looping: bool) {
        self.position = 0.0;
        self.volume = volume.clamp(0.0, 1.0);
        self.pitch = pitch;
        self.looping = looping;
        self.playing = true;
    }

    /// Advance playback by a scaled delta
    pub fn advance(&mut self, delta: f32) {
        if self.playing {
            self.position += delta * self.pitch;
        }
    }
}

impl Pooled for AudioVoice {
    fn instantiate(template: AssetHandle) -> Self {
        Self {
            template,
            position: 0.0,
            volume: 0.0,
            pitch: 1.0,
            looping: false,
            playing: false,
        }
    }

    fn reset(&mut self) {
        *self = Self::instantiate(self.template);
    }
}

/// A pooled visual effect; the renderer mirrors this state
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    /// Effect template
    pub template: AssetHandle,
    /// World transform
    pub transform: Transform,
    /// Uniform scale
    pub scale: f32,
    /// Simulation time in seconds
    pub time: f32,
    /// Whether particles are being emitted
    pub emitting: bool,
}

impl EffectInstance {
    /// Start emitting at a transform
    pub fn start(&mut self, transform: Transform, scale: f32) {
        self.transform = transform;
        self.scale = scale;
        self.time = 0.0;
        self.emitting = true;
    }

    /// Advance the simulation by a scaled delta
    pub fn advance(&mut self, delta: f32) {
        if self.emitting {
            self.time += delta;
        }
    }
}

impl Pooled for EffectInstance {
    fn instantiate(template: AssetHandle) -> Self {
        Self {
            template,
            transform: Transform::IDENTITY,
            scale: 1.0,
            time: 0.0,
            emitting: false,
        }
    }

    fn reset(&mut self) {
        *self = Self::instantiate(self.template);
    }
}
