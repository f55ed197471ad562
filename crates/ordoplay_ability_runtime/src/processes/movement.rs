// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::CharacterMotor;
use ordoplay_ability_timeline::{Interpolation, MovementClip};
use std::sync::Arc;

/// Displaces the character along the clip's motion curve
///
/// Each update applies only the part of the displacement gained since the
/// previous update, so the total over a full window equals `displacement`.
#[derive(Default)]
pub struct MovementProcess {
    motor: Option<Arc<dyn CharacterMotor>>,
    applied: f32,
}

impl ClipProcess for MovementProcess {
    type Data = MovementClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, MovementClip>) -> ProcessResult {
        self.motor = scope.service::<dyn CharacterMotor>();
        self.applied = 0.0;
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, MovementClip>, _delta: f32) -> ProcessResult {
        let Some(motor) = &self.motor else {
            return Ok(());
        };
        let target = scope.data.curve.evaluate(scope.progress());
        let step = target - self.applied;
        if step != 0.0 {
            let delta = Interpolation::scale_vec3(scope.data.displacement, step);
            motor.translate(delta, scope.data.local_space);
            self.applied = target;
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, MovementClip>) -> ProcessResult {
        self.motor = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::PlayMode;
    use crate::testing::play_clip;
    use ordoplay_ability_timeline::{Clip, MotionCurve, MovementClip, TrackKind};

    fn dash(curve: MotionCurve) -> Clip {
        let data = MovementClip {
            displacement: [0.0, 0.0, 4.0],
            curve,
            local_space: true,
        };
        Clip::new("dash", 0.0, 1.0, data)
    }

    #[test]
    fn test_full_window_applies_full_displacement() {
        for curve in [MotionCurve::Linear, MotionCurve::EaseInOut, MotionCurve::Smooth] {
            let recorder = play_clip(TrackKind::Movement, dash(curve), PlayMode::Runtime, &[0.3, 0.3, 0.3, 0.3]);
            let moved = recorder.moved();
            assert!((moved[2] - 4.0).abs() < 1e-4, "{curve:?} moved {moved:?}");
        }
    }

    #[test]
    fn test_constant_curve_moves_once() {
        let recorder = play_clip(TrackKind::Movement, dash(MotionCurve::Constant), PlayMode::Runtime, &[0.5, 0.6]);
        assert_eq!(recorder.events_with("move").len(), 1);
        assert_eq!(recorder.moved(), [0.0, 0.0, 4.0]);
    }
}
