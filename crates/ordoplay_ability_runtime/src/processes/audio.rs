// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::ProcessResult;
use crate::pool::{AudioPool, PoolHandle};
use crate::process::{ClipProcess, ClipScope};
use ordoplay_ability_timeline::AudioClip;
use std::sync::Arc;

/// Plays a pooled audio voice for the clip window
#[derive(Default)]
pub struct AudioProcess {
    pool: Option<Arc<AudioPool>>,
    voice: Option<PoolHandle>,
}

impl ClipProcess for AudioProcess {
    type Data = AudioClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, AudioClip>) -> ProcessResult {
        let Some(pool) = scope.service::<AudioPool>() else {
            return Ok(());
        };
        let Some(template) = scope.data.audio.handle() else {
            tracing::warn!("Audio clip '{}' has no resolved sound", scope.clip.name);
            return Ok(());
        };

        let voice = pool.acquire(template);
        let data = scope.data;
        pool.with_instance(voice, |v| v.play(data.volume, data.pitch, data.looping));

        // Interrupted sessions still hand the voice back.
        let release = pool.clone();
        scope.on_cleanup(move || {
            release.release(voice);
        });

        self.voice = Some(voice);
        self.pool = Some(pool);
        Ok(())
    }

    fn on_update(&mut self, _scope: &mut ClipScope<'_, AudioClip>, delta: f32) -> ProcessResult {
        if let (Some(pool), Some(voice)) = (&self.pool, self.voice) {
            pool.with_instance(voice, |v| v.advance(delta));
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, AudioClip>) -> ProcessResult {
        if let (Some(pool), Some(voice)) = (self.pool.take(), self.voice.take()) {
            pool.release(voice);
        }
        Ok(())
    }
}
