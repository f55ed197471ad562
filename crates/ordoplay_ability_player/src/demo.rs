// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample ability written out by `--write-demo`.

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use ordoplay_ability_timeline::{
    resolver, AnimationClip, AssetHandle, AssetKind, AssetManifest, AssetRef, Attachment,
    AudioClip, BindPoint, CameraClip, Clip, DamageClip, EventClip, EventParam, Group, HitShape,
    MotionCurve, MovementClip, SpawnClip, Timeline, Track, TrackKind, VfxClip,
};
use ordoplay_ability_timeline::resolver::AssetResolver;
use std::path::{Path, PathBuf};

/// Assets the sample ability refers to
pub fn manifest() -> AssetManifest {
    AssetManifest::new()
        .with("anim/fireball_cast", AssetKind::Animation, AssetHandle(100))
        .with("sfx/fireball_whoosh", AssetKind::Audio, AssetHandle(200))
        .with("fx/hand_flame", AssetKind::Effect, AssetHandle(300))
        .with("prefab/fireball", AssetKind::Prefab, AssetHandle(400))
}

/// A fireball cast touching every clip kind
pub fn fireball() -> Result<Timeline> {
    let manifest = manifest();
    let handle = |identity: &str, kind| -> AssetRef {
        match manifest.resolve(kind, identity) {
            Some(handle) => AssetRef::resolved(identity, handle),
            None => AssetRef::from_identity(identity),
        }
    };

    let mut timeline = Timeline::new("Fireball");
    let caster = timeline.add_group(Group::new("Caster"));
    let effects = timeline.add_group(Group::new("Effects"));
    let gameplay = timeline.add_group(Group::new("Gameplay"));

    let body = timeline.add_track(caster, Track::new("Body", TrackKind::Animation))?;
    timeline.add_clip(
        body,
        Clip::new(
            "Cast",
            0.0,
            1.2,
            AnimationClip {
                animation: handle("anim/fireball_cast", AssetKind::Animation),
                blend_in: 0.1,
                blend_out: 0.2,
                ..AnimationClip::default()
            },
        ),
    )?;

    let step = timeline.add_track(caster, Track::new("Step", TrackKind::Movement))?;
    timeline.add_clip(
        step,
        Clip::new(
            "Lunge",
            0.1,
            0.3,
            MovementClip {
                displacement: [0.0, 0.0, 0.8],
                curve: MotionCurve::EaseOut,
                local_space: true,
            },
        ),
    )?;

    let vfx = timeline.add_track(effects, Track::new("Hand", TrackKind::Vfx))?;
    timeline.add_clip(
        vfx,
        Clip::new(
            "Flame",
            0.2,
            0.6,
            VfxClip {
                effect: handle("fx/hand_flame", AssetKind::Effect),
                attachment: Attachment::at(BindPoint::RightHand),
                ..VfxClip::default()
            },
        ),
    )?;

    let sound = timeline.add_track(effects, Track::new("Sound", TrackKind::Audio))?;
    timeline.add_clip(
        sound,
        Clip::new(
            "Whoosh",
            0.5,
            0.6,
            AudioClip {
                audio: handle("sfx/fireball_whoosh", AssetKind::Audio),
                volume: 0.8,
                ..AudioClip::default()
            },
        ),
    )?;

    let camera = timeline.add_track(effects, Track::new("Camera", TrackKind::Camera))?;
    timeline.add_clip(
        camera,
        Clip::new(
            "Release shake",
            0.75,
            0.3,
            CameraClip {
                shake_amplitude: 0.2,
                shake_frequency: 18.0,
                fov_offset: -3.0,
                blend_in: 0.05,
                blend_out: 0.15,
            },
        ),
    )?;

    let spawn = timeline.add_track(gameplay, Track::new("Projectile", TrackKind::Spawn))?;
    timeline.add_clip(
        spawn,
        Clip::new(
            "Fireball",
            0.75,
            0.1,
            SpawnClip {
                prefab: handle("prefab/fireball", AssetKind::Prefab),
                attachment: Attachment::at(BindPoint::RightHand).with_offset([0.0, 0.0, 0.3]),
                detach: true,
                event_tag: "fireball".to_string(),
                target_tags: vec!["enemy".to_string()],
            },
        ),
    )?;

    let damage = timeline.add_track(gameplay, Track::new("Burn", TrackKind::Damage))?;
    timeline.add_clip(
        damage,
        Clip::new(
            "Hand burn",
            0.3,
            0.4,
            DamageClip {
                damage: 5.0,
                shape: HitShape::Sphere { radius: 0.4 },
                attachment: Attachment::at(BindPoint::RightHand),
                target_tags: vec!["enemy".to_string()],
                max_hits_per_target: 1,
            },
        ),
    )?;

    let events = timeline.add_track(gameplay, Track::new("Events", TrackKind::Event))?;
    timeline.add_clip(
        events,
        Clip::new(
            "Release",
            0.75,
            0.0,
            EventClip::new("fireball_released").with_param("mana", EventParam::Int(25)),
        ),
    )?;
    timeline.add_clip(events, Clip::new("Recover", 1.2, 0.0, EventClip::new("cast_recovered")))?;

    Ok(timeline)
}

/// Write the sample timeline and a config pointing at it into `dir`
///
/// Returns the config path.
pub fn write(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(PlayerError::io(dir))?;

    let manifest = manifest();
    let text = resolver::export(&fireball()?, &manifest)?;
    let timeline_path = dir.join("fireball.ron");
    std::fs::write(&timeline_path, text).map_err(PlayerError::io(&timeline_path))?;

    let config = PlayerConfig {
        timeline: PathBuf::from("fireball.ron"),
        manifest,
        frames: 90,
        ..PlayerConfig::default()
    };
    let config_path = dir.join("player.ron");
    config.save(&config_path).map_err(PlayerError::io(&config_path))?;

    tracing::info!("Wrote demo ability to {}", dir.display());
    Ok(config_path)
}
