// SPDX-License-Identifier: MIT OR Apache-2.0

use super::place;
use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::{ActorId, ActorRig, CombatSink, DebugDraw, HitWindow, HitWindowId};
use ordoplay_ability_timeline::DamageClip;
use std::sync::Arc;

/// Opens a combat hit window for the clip's duration
#[derive(Default)]
pub struct DamageProcess {
    combat: Option<Arc<dyn CombatSink>>,
    rig: Option<Arc<dyn ActorRig>>,
    window: Option<HitWindowId>,
}

impl ClipProcess for DamageProcess {
    type Data = DamageClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, DamageClip>) -> ProcessResult {
        let Some(combat) = scope.service::<dyn CombatSink>() else {
            return Ok(());
        };
        let rig = scope.service::<dyn ActorRig>();
        let data = scope.data;

        let window = HitWindow {
            owner: rig.as_ref().map_or(ActorId::default(), |r| r.actor()),
            source: scope.clip.id,
            damage: data.damage,
            shape: data.shape,
            transform: place(rig.as_ref(), &data.attachment),
            target_tags: data.target_tags.clone(),
            max_hits_per_target: data.max_hits_per_target,
        };
        self.window = Some(combat.open_window(window));
        self.combat = Some(combat);
        self.rig = rig;
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, DamageClip>, _delta: f32) -> ProcessResult {
        if let (Some(combat), Some(window)) = (&self.combat, self.window) {
            combat.update_window(window, place(self.rig.as_ref(), &scope.data.attachment));
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, DamageClip>) -> ProcessResult {
        if let (Some(combat), Some(window)) = (self.combat.take(), self.window.take()) {
            combat.close_window(window);
        }
        self.rig = None;
        Ok(())
    }
}

/// Draws the hit volume in the editor without touching gameplay
#[derive(Default)]
pub struct DamagePreviewProcess {
    draw: Option<Arc<dyn DebugDraw>>,
    rig: Option<Arc<dyn ActorRig>>,
}

impl ClipProcess for DamagePreviewProcess {
    type Data = DamageClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, DamageClip>) -> ProcessResult {
        self.draw = scope.service::<dyn DebugDraw>();
        self.rig = scope.service::<dyn ActorRig>();
        Ok(())
    }

    fn on_update(&mut self, scope: &mut ClipScope<'_, DamageClip>, _delta: f32) -> ProcessResult {
        if let Some(draw) = &self.draw {
            draw.hit_shape(&scope.data.shape, place(self.rig.as_ref(), &scope.data.attachment));
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, DamageClip>) -> ProcessResult {
        self.draw = None;
        self.rig = None;
        Ok(())
    }
}
