// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in handlers for every clip kind.
//!
//! | Kind | Editor preview | Runtime |
//! |---|---|---|
//! | Animation | [`AnimationProcess`] | [`AnimationProcess`] |
//! | Audio | [`AudioProcess`] | [`AudioProcess`] |
//! | VFX | [`VfxProcess`] | [`VfxProcess`] |
//! | Movement | [`MovementProcess`] | [`MovementProcess`] |
//! | Damage | [`DamagePreviewProcess`] | [`DamageProcess`] |
//! | Camera | [`CameraProcess`] | [`CameraProcess`] |
//! | Spawn | [`SpawnProcess`] | [`SpawnProcess`] |
//! | Event | [`EventPreviewProcess`] | [`EventProcess`] |

mod animation;
mod audio;
mod camera;
mod damage;
mod event;
mod movement;
mod spawn;
mod vfx;

pub use animation::AnimationProcess;
pub use audio::AudioProcess;
pub use camera::CameraProcess;
pub use damage::{DamagePreviewProcess, DamageProcess};
pub use event::{EventPreviewProcess, EventProcess};
pub use movement::MovementProcess;
pub use spawn::SpawnProcess;
pub use vfx::VfxProcess;

use crate::error::RegistryError;
use crate::registry::{PlayMode, ProcessRegistryBuilder};
use crate::services::{ActorRig, Transform};
use ordoplay_ability_timeline::Attachment;
use std::sync::Arc;

const BOTH: &[PlayMode] = &PlayMode::ALL;
const PREVIEW: &[PlayMode] = &[PlayMode::EditorPreview];
const RUNTIME: &[PlayMode] = &[PlayMode::Runtime];

/// Register every built-in handler
pub fn register_builtin(builder: &mut ProcessRegistryBuilder) -> Result<(), RegistryError> {
    builder
        .register_process::<AnimationProcess>(BOTH)?
        .register_process::<AudioProcess>(BOTH)?
        .register_process::<VfxProcess>(BOTH)?
        .register_process::<MovementProcess>(BOTH)?
        .register_process::<DamagePreviewProcess>(PREVIEW)?
        .register_process::<DamageProcess>(RUNTIME)?
        .register_process::<CameraProcess>(BOTH)?
        .register_process::<SpawnProcess>(BOTH)?
        .register_process::<EventPreviewProcess>(PREVIEW)?
        .register_process::<EventProcess>(RUNTIME)?;
    Ok(())
}

/// Fade weight for a clip with blend-in/out ramps
pub(crate) fn blend_weight(local_time: f32, duration: f32, blend_in: f32, blend_out: f32) -> f32 {
    let mut weight = 1.0_f32;
    if blend_in > 0.0 {
        weight = weight.min(local_time / blend_in);
    }
    if blend_out > 0.0 {
        weight = weight.min((duration - local_time) / blend_out);
    }
    weight.clamp(0.0, 1.0)
}

/// World placement of an attachment; the character root when no rig is available
pub(crate) fn place(rig: Option<&Arc<dyn ActorRig>>, attachment: &Attachment) -> Transform {
    let base = rig
        .and_then(|rig| rig.bone(attachment.bind_point, attachment.custom_name()))
        .unwrap_or(Transform::IDENTITY);
    base.offset_by(attachment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weight() {
        assert_eq!(blend_weight(0.5, 2.0, 0.0, 0.0), 1.0);
        assert_eq!(blend_weight(0.0, 2.0, 0.5, 0.0), 0.0);
        assert_eq!(blend_weight(0.25, 2.0, 0.5, 0.0), 0.5);
        assert_eq!(blend_weight(1.75, 2.0, 0.0, 0.5), 0.5);
        assert_eq!(blend_weight(2.0, 2.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn test_place_without_rig_uses_root() {
        let attachment = Attachment::at(ordoplay_ability_timeline::BindPoint::Head).with_offset([0.0, 0.0, 2.0]);
        assert_eq!(place(None, &attachment).position, [0.0, 0.0, 2.0]);
    }
}
