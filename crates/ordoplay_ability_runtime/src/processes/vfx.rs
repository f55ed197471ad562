// SPDX-License-Identifier: MIT OR Apache-2.0

use super::place;
use crate::error::ProcessResult;
use crate::pool::{EffectPool, PoolHandle};
use crate::process::{ClipProcess, ClipScope};
use crate::services::ActorRig;
use ordoplay_ability_timeline::VfxClip;
use std::sync::Arc;

/// Shows a pooled effect at a bind point
#[derive(Default)]
pub struct VfxProcess {
    pool: Option<Arc<EffectPool>>,
    rig: Option<Arc<dyn ActorRig>>,
    effect: Option<PoolHandle>,
}

impl ClipProcess for VfxProcess {
    type Data = VfxClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, VfxClip>) -> ProcessResult {
        let Some(pool) = scope.service::<EffectPool>() else {
            return Ok(());
        };
        let Some(template) = scope.data.effect.handle() else {
            tracing::warn!("VFX clip '{}' has no resolved effect", scope.clip.name);
            return Ok(());
        };

        let rig = scope.service::<dyn ActorRig>();
        let transform = place(rig.as_ref(), &scope.data.attachment);
        let effect = pool.acquire(template);
        let scale = scope.data.scale;
        pool.with_instance(effect, |fx| fx.start(transform, scale));

        let release = pool.clone();
        scope.on_cleanup(move || {
            release.release(effect);
        });

        self.effect = Some(effect);
        self.pool = Some(pool);
        self.rig = rig;
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, VfxClip>, delta: f32) -> ProcessResult {
        let (Some(pool), Some(effect)) = (&self.pool, self.effect) else {
            return Ok(());
        };
        let follow = scope
            .data
            .follow
            .then(|| place(self.rig.as_ref(), &scope.data.attachment));
        pool.with_instance(effect, |fx| {
            if let Some(transform) = follow {
                fx.transform = transform;
            }
            fx.advance(delta);
        });
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, VfxClip>) -> ProcessResult {
        if let (Some(pool), Some(effect)) = (self.pool.take(), self.effect.take()) {
            pool.release(effect);
        }
        self.rig = None;
        Ok(())
    }
}
