// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::ProcessResult;
use crate::process::{ClipProcess, ClipScope};
use crate::services::EventSink;
use ordoplay_ability_timeline::EventClip;

/// Delivers the event to the gameplay event sink when the clip is entered
#[derive(Default)]
pub struct EventProcess;

impl ClipProcess for EventProcess {
    type Data = EventClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, EventClip>) -> ProcessResult {
        if let Some(sink) = scope.service::<dyn EventSink>() {
            sink.dispatch(scope.data, scope.time);
        }
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, EventClip>) -> ProcessResult {
        Ok(())
    }
}

/// Logs the event in the editor instead of running gameplay scripts
#[derive(Default)]
pub struct EventPreviewProcess;

impl ClipProcess for EventPreviewProcess {
    type Data = EventClip;

    fn on_enter(&mut self, scope: &mut ClipScope<'_, EventClip>) -> ProcessResult {
        tracing::info!(
            "Event '{}' at {:.3}s ({} param(s))",
            scope.data.name,
            scope.time,
            scope.data.params.len()
        );
        Ok(())
    }

    fn on_exit(&mut self, _scope: &mut ClipScope<'_, EventClip>) -> ProcessResult {
        Ok(())
    }
}
