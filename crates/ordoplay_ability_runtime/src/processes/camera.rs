// SPDX-License-Identifier: MIT OR Apache-2.0

use super::blend_weight;
use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::{CameraCue, CameraRig};
use ordoplay_ability_timeline::{CameraClip, ClipId};
use std::sync::Arc;

/// Feeds a blended shake/FOV cue to the camera rig
#[derive(Default)]
pub struct CameraProcess {
    rig: Option<Arc<dyn CameraRig>>,
    source: Option<ClipId>,
}

impl ClipProcess for CameraProcess {
    type Data = CameraClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, CameraClip>) -> ProcessResult {
        self.rig = scope.service::<dyn CameraRig>();
        self.source = Some(scope.clip.id);
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, CameraClip>, _delta: f32) -> ProcessResult {
        if let (Some(rig), Some(source)) = (&self.rig, self.source) {
            let data = scope.data;
            let cue = CameraCue {
                shake_amplitude: data.shake_amplitude,
                shake_frequency: data.shake_frequency,
                fov_offset: data.fov_offset,
                weight: blend_weight(scope.local_time(), scope.clip.duration, data.blend_in, data.blend_out),
            };
            rig.apply(source, cue);
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, CameraClip>) -> ProcessResult {
        if let (Some(rig), Some(source)) = (self.rig.take(), self.source.take()) {
            rig.release(source);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::PlayMode;
    use crate::testing::play_clip;
    use ordoplay_ability_timeline::{CameraClip, Clip, TrackKind};

    #[test]
    fn test_cue_blends_out_and_releases() {
        let data = CameraClip {
            shake_amplitude: 0.3,
            shake_frequency: 12.0,
            blend_out: 0.5,
            ..CameraClip::default()
        };
        let clip = Clip::new("impact", 0.0, 1.0, data);
        let recorder = play_clip(TrackKind::Camera, clip, PlayMode::Runtime, &[0.25, 0.5, 0.5]);

        assert_eq!(
            recorder.events_with("camera"),
            vec![
                "camera.apply 1.00",
                "camera.apply 1.00",
                "camera.apply 0.50",
                "camera.apply 0.00",
                "camera.release",
            ]
        );
    }
}
