// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process registry: maps (clip kind, play mode) to a handler factory.
//!
//! The registry is filled once at start-up through [`ProcessRegistryBuilder`]
//! and is immutable afterwards, so runners on several threads can share it
//! behind an `Arc`. Lookups are exact on the pair: a kind registered only for
//! runtime has no handler in editor preview, and the runner refuses to play
//! a timeline that uses it there.

use crate::error::RegistryError;
use crate::process::{Bound, ClipProcess, ErasedProcess};
use indexmap::IndexMap;
use ordoplay_ability_timeline::{ClipData, ClipKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Context tag selecting which handler set services a clip kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayMode {
    /// Scrubbing and previewing inside the editor
    EditorPreview,
    /// Live gameplay
    #[default]
    Runtime,
}

impl PlayMode {
    /// Every play mode
    pub const ALL: [PlayMode; 2] = [Self::EditorPreview, Self::Runtime];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::EditorPreview => "Editor Preview",
            Self::Runtime => "Runtime",
        }
    }
}

/// Creates a fresh, unbound handler
pub(crate) type ProcessFactory = Arc<dyn Fn() -> Box<dyn ErasedProcess> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Registration {
    pub handler: &'static str,
    pub factory: ProcessFactory,
}

/// Collects registrations before the registry is frozen
#[derive(Default)]
pub struct ProcessRegistryBuilder {
    entries: IndexMap<(ClipKind, PlayMode), Registration>,
}

impl ProcessRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_free(
        &self,
        kind: ClipKind,
        mode: PlayMode,
        handler: &'static str,
    ) -> Result<(), RegistryError> {
        match self.entries.get(&(kind, mode)) {
            Some(existing) => Err(RegistryError::Duplicate {
                kind,
                mode,
                existing: existing.handler,
                rejected: handler,
            }),
            None => Ok(()),
        }
    }

    /// Register a default-constructed handler for each of `modes`
    pub fn register_process<P: ClipProcess>(
        &mut self,
        modes: &[PlayMode],
    ) -> Result<&mut Self, RegistryError> {
        self.register_with(modes, P::default)
    }

    /// Register a handler built by `make` for each of `modes`
    ///
    /// Either every mode is registered or, on a duplicate, none is.
    pub fn register_with<P: ClipProcess>(
        &mut self,
        modes: &[PlayMode],
        make: impl Fn() -> P + Send + Sync + 'static,
    ) -> Result<&mut Self, RegistryError> {
        let kind = P::Data::KIND;
        let handler = short_type_name(std::any::type_name::<P>());

        for (idx, &mode) in modes.iter().enumerate() {
            self.ensure_free(kind, mode, handler)?;
            if modes[..idx].contains(&mode) {
                return Err(RegistryError::Duplicate {
                    kind,
                    mode,
                    existing: handler,
                    rejected: handler,
                });
            }
        }

        let make = Arc::new(make);
        for &mode in modes {
            let make = make.clone();
            let factory: ProcessFactory =
                Arc::new(move || Box::new(Bound::new(make())) as Box<dyn ErasedProcess>);
            tracing::trace!("Registered {} for {:?}/{:?}", handler, kind, mode);
            self.entries.insert((kind, mode), Registration { handler, factory });
        }
        Ok(self)
    }

    /// Freeze the registrations
    pub fn build(self) -> ProcessRegistry {
        tracing::debug!("Process registry built with {} registration(s)", self.entries.len());
        ProcessRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable (clip kind, play mode) → handler table
pub struct ProcessRegistry {
    entries: IndexMap<(ClipKind, PlayMode), Registration>,
}

impl ProcessRegistry {
    /// Start building a registry
    pub fn builder() -> ProcessRegistryBuilder {
        ProcessRegistryBuilder::new()
    }

    /// Registry holding every built-in clip handler
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        crate::processes::register_builtin(&mut builder)?;
        Ok(builder.build())
    }

    pub(crate) fn resolve(&self, kind: ClipKind, mode: PlayMode) -> Result<&Registration, RegistryError> {
        self.entries
            .get(&(kind, mode))
            .ok_or(RegistryError::NotFound { kind, mode })
    }

    /// Handler type name registered for a pair
    pub fn handler_name(&self, kind: ClipKind, mode: PlayMode) -> Result<&'static str, RegistryError> {
        self.resolve(kind, mode).map(|r| r.handler)
    }

    /// Whether a pair has a handler
    pub fn contains(&self, kind: ClipKind, mode: PlayMode) -> bool {
        self.entries.contains_key(&(kind, mode))
    }

    /// All registrations in registration order
    pub fn registrations(&self) -> impl Iterator<Item = (ClipKind, PlayMode, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|(&(kind, mode), registration)| (kind, mode, registration.handler))
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    // Keep generic arguments intact, drop the module path of the outer type.
    let outer = full.split('<').next().unwrap_or(full);
    match outer.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
