// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capabilities handlers reach through the process context.
//!
//! The embedding application supplies a [`ServiceProvider`]; the runtime
//! never constructs concrete services itself. Every capability is optional:
//! a handler that finds its service missing skips that feature for the run.

use crate::pool::{AudioPool, EffectPool};
use ordoplay_ability_timeline::{
    AssetHandle, Attachment, BindPoint, BlendMode, ClipId, EventClip, HitShape,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Position and euler rotation (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position
    pub position: [f32; 3],
    /// Euler rotation in degrees
    pub rotation: [f32; 3],
}

impl Transform {
    /// Origin with no rotation
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0; 3],
    };

    /// Transform at a position
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Apply an attachment's positional and rotational offsets
    pub fn offset_by(self, attachment: &Attachment) -> Self {
        Self {
            position: add3(self.position, attachment.offset),
            rotation: add3(self.rotation, attachment.rotation),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn add3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Identifies a character in the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActorId(pub u64);

/// Spawned object returned by a [`Spawner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectileHandle(pub u64);

/// Animation playing through an [`Animator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u64);

/// Open hit window in a [`CombatSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitWindowId(pub u64);

/// Request to start an animation layer
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRequest {
    /// Animation asset
    pub animation: AssetHandle,
    /// Optional bone mask
    pub mask: Option<AssetHandle>,
    /// Blend layer
    pub layer: u32,
    /// Layer blend mode
    pub blend_mode: BlendMode,
    /// Playback speed
    pub speed: f32,
}

/// Everything a spawner needs to create an object
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    /// Prefab to instantiate
    pub prefab: AssetHandle,
    /// World placement
    pub transform: Transform,
    /// Whether the object outlives its clip
    pub detach: bool,
    /// Parent actor while attached
    pub parent: Option<ActorId>,
    /// Gameplay tag sent with the spawn
    pub event_tag: String,
    /// Tags the object may affect
    pub target_tags: Vec<String>,
    /// Actor that owns the ability
    pub owner: ActorId,
}

/// Damage volume opened by a runtime damage clip
#[derive(Debug, Clone, PartialEq)]
pub struct HitWindow {
    /// Attacking actor
    pub owner: ActorId,
    /// Clip that opened the window
    pub source: ClipId,
    /// Damage per hit
    pub damage: f32,
    /// Hit volume
    pub shape: HitShape,
    /// Volume placement
    pub transform: Transform,
    /// Target filter (empty: everything)
    pub target_tags: Vec<String>,
    /// Hit limit per target
    pub max_hits_per_target: u32,
}

/// Camera state contributed by one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCue {
    /// Shake amplitude
    pub shake_amplitude: f32,
    /// Shake frequency in Hz
    pub shake_frequency: f32,
    /// Field of view offset in degrees
    pub fov_offset: f32,
    /// Blend weight (0..1)
    pub weight: f32,
}

/// Bone lookup on the controlled character
pub trait ActorRig: Send + Sync {
    /// Actor the timeline is playing on
    fn actor(&self) -> ActorId;

    /// World transform of a bind point; `custom_name` names the bone for custom points
    fn bone(&self, bind_point: BindPoint, custom_name: &str) -> Option<Transform>;
}

/// Animation backend
pub trait Animator: Send + Sync {
    /// Start a layer
    fn play(&self, request: &AnimationRequest) -> AnimationHandle;
    /// Set the layer weight
    fn set_weight(&self, handle: AnimationHandle, weight: f32);
    /// Pose the layer at a local time
    fn sample(&self, handle: AnimationHandle, time: f32);
    /// Remove the layer
    fn stop(&self, handle: AnimationHandle);
}

/// Object spawning
pub trait Spawner: Send + Sync {
    /// Spawn an object, `None` if the host refused
    fn spawn(&self, request: SpawnRequest) -> Option<ProjectileHandle>;
    /// Destroy a spawned object
    fn destroy(&self, handle: ProjectileHandle);
}

/// Character displacement
pub trait CharacterMotor: Send + Sync {
    /// Move the character by `delta`
    fn translate(&self, delta: [f32; 3], local_space: bool);
}

/// Gameplay damage resolution
pub trait CombatSink: Send + Sync {
    /// Start testing a hit volume
    fn open_window(&self, window: HitWindow) -> HitWindowId;
    /// Move an open volume
    fn update_window(&self, id: HitWindowId, transform: Transform);
    /// Stop testing a volume
    fn close_window(&self, id: HitWindowId);
}

/// Camera effects
pub trait CameraRig: Send + Sync {
    /// Apply or refresh the cue contributed by `source`
    fn apply(&self, source: ClipId, cue: CameraCue);
    /// Remove the cue contributed by `source`
    fn release(&self, source: ClipId);
}

/// Receiver of scripted timeline events
pub trait EventSink: Send + Sync {
    /// Deliver an event fired at timeline `time`
    fn dispatch(&self, event: &EventClip, time: f32);
}

/// Editor gizmo drawing
pub trait DebugDraw: Send + Sync {
    /// Draw a hit volume for one frame
    fn hit_shape(&self, shape: &HitShape, transform: Transform);
}

/// Capability names used for lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// [`ActorRig`]
    ActorRig,
    /// [`Animator`]
    Animator,
    /// [`Spawner`]
    Spawner,
    /// [`CharacterMotor`]
    CharacterMotor,
    /// [`CombatSink`]
    CombatSink,
    /// [`CameraRig`]
    CameraRig,
    /// [`EventSink`]
    EventSink,
    /// [`DebugDraw`]
    DebugDraw,
    /// [`AudioPool`]
    AudioPool,
    /// [`EffectPool`]
    EffectPool,
}

/// A provided capability
#[derive(Clone)]
#[allow(missing_docs)]
pub enum Service {
    ActorRig(Arc<dyn ActorRig>),
    Animator(Arc<dyn Animator>),
    Spawner(Arc<dyn Spawner>),
    CharacterMotor(Arc<dyn CharacterMotor>),
    CombatSink(Arc<dyn CombatSink>),
    CameraRig(Arc<dyn CameraRig>),
    EventSink(Arc<dyn EventSink>),
    DebugDraw(Arc<dyn DebugDraw>),
    AudioPool(Arc<AudioPool>),
    EffectPool(Arc<EffectPool>),
}

/// Supplies capabilities on demand
pub trait ServiceProvider: Send + Sync {
    /// The capability for `kind`, or `None` when the host has none
    fn provide(&self, kind: ServiceKind) -> Option<Service>;
}

/// Typed access to one [`Service`] variant
pub trait Capability {
    /// Lookup key
    const KIND: ServiceKind;

    /// Wrap a concrete service
    fn wrap(service: Arc<Self>) -> Service;

    /// Borrow the service back out if the variant matches
    fn extract(service: &Service) -> Option<Arc<Self>>;
}

macro_rules! capability {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        impl Service {
            /// Lookup key of this service
            pub fn kind(&self) -> ServiceKind {
                match self {
                    $(Self::$variant(_) => ServiceKind::$variant,)*
                }
            }
        }

        $(
            impl Capability for $ty {
                const KIND: ServiceKind = ServiceKind::$variant;

                fn wrap(service: Arc<Self>) -> Service {
                    Service::$variant(service)
                }

                fn extract(service: &Service) -> Option<Arc<Self>> {
                    match service {
                        Service::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

capability! {
    ActorRig => dyn ActorRig,
    Animator => dyn Animator,
    Spawner => dyn Spawner,
    CharacterMotor => dyn CharacterMotor,
    CombatSink => dyn CombatSink,
    CameraRig => dyn CameraRig,
    EventSink => dyn EventSink,
    DebugDraw => dyn DebugDraw,
    AudioPool => AudioPool,
    EffectPool => EffectPool,
}

/// Provider backed by a fixed table of services
#[derive(Clone, Default)]
pub struct ServiceTable {
    services: HashMap<ServiceKind, Service>,
}

impl ServiceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability
    pub fn with<C: Capability + ?Sized>(mut self, service: Arc<C>) -> Self {
        self.insert(service);
        self
    }

    /// Add or replace a capability
    pub fn insert<C: Capability + ?Sized>(&mut self, service: Arc<C>) {
        self.services.insert(C::KIND, C::wrap(service));
    }

    /// Remove a capability
    pub fn remove(&mut self, kind: ServiceKind) -> Option<Service> {
        self.services.remove(&kind)
    }

    /// Number of capabilities
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceProvider for ServiceTable {
    fn provide(&self, kind: ServiceKind) -> Option<Service> {
        self.services.get(&kind).cloned()
    }
}
