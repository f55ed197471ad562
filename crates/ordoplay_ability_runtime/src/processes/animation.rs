// SPDX-License-Identifier: MIT OR Apache-2.0

use super::blend_weight;
use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::{AnimationHandle, AnimationRequest, Animator};
use ordoplay_ability_timeline::AnimationClip;
use std::sync::Arc;

/// Plays an animation layer through the [`Animator`] service
#[derive(Default)]
pub struct AnimationProcess {
    animator: Option<Arc<dyn Animator>>,
    layer: Option<AnimationHandle>,
}

impl ClipProcess for AnimationProcess {
    type Data = AnimationClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, AnimationClip>) -> ProcessResult {
        let Some(animator) = scope.service::<dyn Animator>() else {
            return Ok(());
        };
        let Some(animation) = scope.data.animation.handle() else {
            tracing::warn!("Animation clip '{}' has no resolved animation", scope.clip.name);
            return Ok(());
        };

        let request = AnimationRequest {
            animation,
            mask: scope.data.mask.handle(),
            layer: scope.data.layer,
            blend_mode: scope.data.blend_mode,
            speed: scope.data.speed,
        };
        self.layer = Some(animator.play(&request));
        self.animator = Some(animator);
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, AnimationClip>, _delta: f32) -> ProcessResult {
        if let (Some(animator), Some(layer)) = (&self.animator, self.layer) {
            let local = scope.local_time();
            let data = scope.data;
            animator.set_weight(layer, blend_weight(local, scope.clip.duration, data.blend_in, data.blend_out));
            animator.sample(layer, local * data.speed);
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, AnimationClip>) -> ProcessResult {
        if let (Some(animator), Some(layer)) = (self.animator.take(), self.layer.take()) {
            animator.stop(layer);
        }
        Ok(())
    }
}
