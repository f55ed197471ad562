// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions: a shared timing envelope around a per-kind payload.

use crate::asset::{AssetKind, AssetRef};
use crate::bind::Attachment;
use crate::curve::MotionCurve;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Behavioral kind of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClipKind {
    /// Character animation
    Animation,
    /// Audio playback
    Audio,
    /// Visual effect
    Vfx,
    /// Root motion / displacement
    Movement,
    /// Damage window
    Damage,
    /// Camera cue
    Camera,
    /// Projectile or object spawn
    Spawn,
    /// Scripted event
    Event,
}

impl ClipKind {
    /// Every clip kind
    pub const ALL: [ClipKind; 8] = [
        Self::Animation,
        Self::Audio,
        Self::Vfx,
        Self::Movement,
        Self::Damage,
        Self::Camera,
        Self::Spawn,
        Self::Event,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "Animation",
            Self::Audio => "Audio",
            Self::Vfx => "VFX",
            Self::Movement => "Movement",
            Self::Damage => "Damage",
            Self::Camera => "Camera",
            Self::Spawn => "Spawn",
            Self::Event => "Event",
        }
    }
}

/// A timed clip on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Display name
    pub name: String,
    /// Start time in seconds from the timeline origin
    pub start: f32,
    /// Length in seconds; zero marks an instantaneous clip
    pub duration: f32,
    /// Disabled clips are never activated
    pub enabled: bool,
    /// Kind-specific data
    pub payload: ClipPayload,
}

impl Clip {
    /// Create a new enabled clip
    pub fn new(name: impl Into<String>, start: f32, duration: f32, payload: impl Into<ClipPayload>) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            start,
            duration,
            enabled: true,
            payload: payload.into(),
        }
    }

    /// Kind of the payload
    pub fn kind(&self) -> ClipKind {
        self.payload.kind()
    }

    /// End of the window (exclusive)
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    /// Whether this clip fires instantly rather than spanning a window
    pub fn is_instant(&self) -> bool {
        self.duration <= 0.0
    }

    /// Whether `[start, end)` contains `time`
    pub fn contains(&self, time: f32) -> bool {
        !self.is_instant() && time >= self.start && time < self.end()
    }

    /// Whether the windows of two clips intersect
    pub fn overlaps(&self, other: &Clip) -> bool {
        if self.is_instant() || other.is_instant() {
            return false;
        }
        self.start < other.end() && other.start < self.end()
    }

    /// Whether start and duration are finite and non-negative
    pub fn has_valid_timing(&self) -> bool {
        valid_timing(self.start, self.duration)
    }

    /// Time elapsed inside the window, clamped to it
    pub fn local_time(&self, time: f32) -> f32 {
        (time - self.start).clamp(0.0, self.duration.max(0.0))
    }

    /// Normalized progress through the window
    pub fn progress(&self, time: f32) -> f32 {
        if self.is_instant() {
            return 1.0;
        }
        self.local_time(time) / self.duration
    }

    /// Typed view of the payload
    pub fn data<C: ClipData>(&self) -> Option<&C> {
        C::narrow(&self.payload)
    }

    /// Clone with a fresh identifier
    pub fn duplicate(&self) -> Self {
        let mut clip = self.clone();
        clip.id = ClipId::new();
        clip
    }

    /// Every external asset field with its kind
    pub fn asset_refs(&self) -> Vec<(AssetKind, &AssetRef)> {
        match &self.payload {
            ClipPayload::Animation(c) => vec![
                (AssetKind::Animation, &c.animation),
                (AssetKind::AvatarMask, &c.mask),
            ],
            ClipPayload::Audio(c) => vec![(AssetKind::Audio, &c.audio)],
            ClipPayload::Vfx(c) => vec![(AssetKind::Effect, &c.effect)],
            ClipPayload::Spawn(c) => vec![(AssetKind::Prefab, &c.prefab)],
            ClipPayload::Movement(_)
            | ClipPayload::Damage(_)
            | ClipPayload::Camera(_)
            | ClipPayload::Event(_) => Vec::new(),
        }
    }

    /// Mutable access to every external asset field with its kind
    pub fn asset_refs_mut(&mut self) -> Vec<(AssetKind, &mut AssetRef)> {
        match &mut self.payload {
            ClipPayload::Animation(c) => vec![
                (AssetKind::Animation, &mut c.animation),
                (AssetKind::AvatarMask, &mut c.mask),
            ],
            ClipPayload::Audio(c) => vec![(AssetKind::Audio, &mut c.audio)],
            ClipPayload::Vfx(c) => vec![(AssetKind::Effect, &mut c.effect)],
            ClipPayload::Spawn(c) => vec![(AssetKind::Prefab, &mut c.prefab)],
            ClipPayload::Movement(_)
            | ClipPayload::Damage(_)
            | ClipPayload::Camera(_)
            | ClipPayload::Event(_) => Vec::new(),
        }
    }
}

pub(crate) fn valid_timing(start: f32, duration: f32) -> bool {
    start.is_finite() && duration.is_finite() && start >= 0.0 && duration >= 0.0
}

/// Kind-specific clip data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClipPayload {
    /// Animation clip
    Animation(AnimationClip),
    /// Audio clip
    Audio(AudioClip),
    /// Visual effect clip
    Vfx(VfxClip),
    /// Movement clip
    Movement(MovementClip),
    /// Damage window clip
    Damage(DamageClip),
    /// Camera cue clip
    Camera(CameraClip),
    /// Spawn clip
    Spawn(SpawnClip),
    /// Scripted event clip
    Event(EventClip),
}

impl ClipPayload {
    /// Kind of this payload
    pub fn kind(&self) -> ClipKind {
        match self {
            Self::Animation(_) => ClipKind::Animation,
            Self::Audio(_) => ClipKind::Audio,
            Self::Vfx(_) => ClipKind::Vfx,
            Self::Movement(_) => ClipKind::Movement,
            Self::Damage(_) => ClipKind::Damage,
            Self::Camera(_) => ClipKind::Camera,
            Self::Spawn(_) => ClipKind::Spawn,
            Self::Event(_) => ClipKind::Event,
        }
    }
}

/// Payload types that narrow out of [`ClipPayload`]
pub trait ClipData: Into<ClipPayload> + 'static {
    /// Kind this payload belongs to
    const KIND: ClipKind;

    /// Borrow the payload as this type if the kinds match
    fn narrow(payload: &ClipPayload) -> Option<&Self>;
}

macro_rules! clip_data {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl ClipData for $ty {
                const KIND: ClipKind = ClipKind::$variant;

                fn narrow(payload: &ClipPayload) -> Option<&Self> {
                    match payload {
                        ClipPayload::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ClipPayload {
                fn from(data: $ty) -> Self {
                    ClipPayload::$variant(data)
                }
            }
        )*
    };
}

clip_data! {
    AnimationClip => Animation,
    AudioClip => Audio,
    VfxClip => Vfx,
    MovementClip => Movement,
    DamageClip => Damage,
    CameraClip => Camera,
    SpawnClip => Spawn,
    EventClip => Event,
}

/// How an animation layer combines with the layers below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Replace lower layers
    #[default]
    Override,
    /// Add on top of lower layers
    Additive,
}

/// Plays an animation on the character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Animation asset
    pub animation: AssetRef,
    /// Optional bone mask
    #[serde(default)]
    pub mask: AssetRef,
    /// Blend layer index
    pub layer: u32,
    /// Layer blend mode
    pub blend_mode: BlendMode,
    /// Playback speed multiplier
    pub speed: f32,
    /// Blend-in time in seconds
    pub blend_in: f32,
    /// Blend-out time in seconds
    pub blend_out: f32,
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            animation: AssetRef::none(),
            mask: AssetRef::none(),
            layer: 0,
            blend_mode: BlendMode::Override,
            speed: 1.0,
            blend_in: 0.0,
            blend_out: 0.0,
        }
    }
}

/// Plays a sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    /// Audio asset
    pub audio: AssetRef,
    /// Volume (0..1)
    pub volume: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Loop the sound until the clip ends
    pub looping: bool,
}

impl Default for AudioClip {
    fn default() -> Self {
        Self {
            audio: AssetRef::none(),
            volume: 1.0,
            pitch: 1.0,
            looping: false,
        }
    }
}

/// Shows a visual effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VfxClip {
    /// Effect template
    pub effect: AssetRef,
    /// Placement on the character
    pub attachment: Attachment,
    /// Uniform scale
    pub scale: f32,
    /// Keep following the bind point while active
    pub follow: bool,
}

impl Default for VfxClip {
    fn default() -> Self {
        Self {
            effect: AssetRef::none(),
            attachment: Attachment::default(),
            scale: 1.0,
            follow: true,
        }
    }
}

/// Moves the character over the clip window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementClip {
    /// Total displacement over the window
    pub displacement: [f32; 3],
    /// Progress curve
    pub curve: MotionCurve,
    /// Interpret displacement in the character's local space
    pub local_space: bool,
}

/// Hit volume of a damage window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    /// Sphere with radius
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Box with half extents
    Box {
        /// Half extents
        half_extents: [f32; 3],
    },
    /// Capsule along the local forward axis
    Capsule {
        /// Radius
        radius: f32,
        /// Length between cap centers
        length: f32,
    },
}

impl Default for HitShape {
    fn default() -> Self {
        Self::Sphere { radius: 1.0 }
    }
}

/// Applies damage to targets inside a hit volume while active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageClip {
    /// Damage per hit
    pub damage: f32,
    /// Hit volume
    pub shape: HitShape,
    /// Placement of the volume
    pub attachment: Attachment,
    /// Only targets carrying one of these tags are hit (empty: all)
    #[serde(default)]
    pub target_tags: Vec<String>,
    /// Maximum hits per target during one window
    pub max_hits_per_target: u32,
}

impl Default for DamageClip {
    fn default() -> Self {
        Self {
            damage: 0.0,
            shape: HitShape::default(),
            attachment: Attachment::default(),
            target_tags: Vec::new(),
            max_hits_per_target: 1,
        }
    }
}

/// Camera shake / field of view cue
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraClip {
    /// Shake amplitude
    pub shake_amplitude: f32,
    /// Shake frequency in Hz
    pub shake_frequency: f32,
    /// Field of view offset in degrees
    pub fov_offset: f32,
    /// Blend-in time
    pub blend_in: f32,
    /// Blend-out time
    pub blend_out: f32,
}

/// Spawns a prefab (projectile, prop)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnClip {
    /// Prefab to spawn
    pub prefab: AssetRef,
    /// Spawn placement
    pub attachment: Attachment,
    /// Leave the spawned object alive after the clip ends
    pub detach: bool,
    /// Tag sent with the spawn request
    #[serde(default)]
    pub event_tag: String,
    /// Tags the spawned object may affect
    #[serde(default)]
    pub target_tags: Vec<String>,
}

/// Typed event parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventParam {
    /// String value
    String(String),
    /// Float value
    Float(f32),
    /// Integer value
    Int(i64),
}

/// Named scripted event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventClip {
    /// Event name
    pub name: String,
    /// Parameters
    #[serde(default)]
    pub params: IndexMap<String, EventParam>,
}

impl EventClip {
    /// Create an event with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: EventParam) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}
