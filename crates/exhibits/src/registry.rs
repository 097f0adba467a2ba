//! Maps exhibit ids to lazily-loaded units and to the preview cards the
//! gallery can show before anything is loaded.
//!
//! Types:
//!
//! - `ExhibitRegistry` owns the ordered entries. Cloning shares the loaders.
//! - `ExhibitPreview` is the lightweight card listed on the gallery.
//! - `PendingUnit` is an in-flight resolve, either already finished or running
//!   on a worker thread; callers poll it from their frame loop.
//! - `ExhibitError` separates unknown ids from units that failed to load.
//!
//! Functions:
//!
//! - `ExhibitRegistry::list_previews` is synchronous and loads nothing.
//! - `ExhibitRegistry::resolve` starts a threaded load; `resolve_now` runs the
//!   same loader inline. Both are idempotent and leave registry state untouched
//!   on failure, so callers may retry.
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::unit::ExhibitUnit;
use crate::ExhibitId;

pub type UnitLoader = Arc<dyn Fn() -> Result<ExhibitUnit, ExhibitError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExhibitError {
    #[error("exhibit '{0}' is not in the registry")]
    NotFound(ExhibitId),

    #[error("exhibit '{id}' failed to load: {reason}")]
    Load { id: ExhibitId, reason: String },
}

impl ExhibitError {
    pub fn load(id: &ExhibitId, reason: impl Into<String>) -> Self {
        Self::Load {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    pub fn id(&self) -> &ExhibitId {
        match self {
            Self::NotFound(id) | Self::Load { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExhibitPreview {
    pub id: ExhibitId,
    pub title: String,
    pub description: String,
    pub coming_soon: bool,
}

#[derive(Clone)]
struct RegistryEntry {
    preview: ExhibitPreview,
    loader: Option<UnitLoader>,
}

#[derive(Clone, Default)]
pub struct ExhibitRegistry {
    entries: Vec<RegistryEntry>,
}

impl std::fmt::Debug for ExhibitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.preview.id))
            .finish()
    }
}

impl ExhibitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the exhibits compiled into this crate.
    pub fn builtin() -> Self {
        crate::builtin::registry()
    }

    /// Adds a loadable exhibit. A later registration with the same id replaces
    /// the earlier one in place, keeping gallery order stable.
    pub fn register(&mut self, preview: ExhibitPreview, loader: UnitLoader) {
        let entry = RegistryEntry {
            preview: ExhibitPreview {
                coming_soon: false,
                ..preview
            },
            loader: Some(loader),
        };
        self.insert(entry);
    }

    /// Adds a gallery card with nothing behind it yet.
    pub fn register_coming_soon(&mut self, preview: ExhibitPreview) {
        let entry = RegistryEntry {
            preview: ExhibitPreview {
                coming_soon: true,
                ..preview
            },
            loader: None,
        };
        self.insert(entry);
    }

    fn insert(&mut self, entry: RegistryEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.preview.id == entry.preview.id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn list_previews(&self) -> Vec<ExhibitPreview> {
        self.entries
            .iter()
            .map(|entry| entry.preview.clone())
            .collect()
    }

    /// Previews that can actually be opened, in gallery order.
    pub fn available(&self) -> impl Iterator<Item = &ExhibitPreview> {
        self.entries
            .iter()
            .filter(|entry| entry.loader.is_some())
            .map(|entry| &entry.preview)
    }

    pub fn contains(&self, id: &ExhibitId) -> bool {
        self.loader_for(id).is_some()
    }

    fn loader_for(&self, id: &ExhibitId) -> Option<UnitLoader> {
        self.entries
            .iter()
            .find(|entry| &entry.preview.id == id)
            .and_then(|entry| entry.loader.clone())
    }

    pub fn resolve_now(&self, id: &ExhibitId) -> Result<ExhibitUnit, ExhibitError> {
        let loader = self
            .loader_for(id)
            .ok_or_else(|| ExhibitError::NotFound(id.clone()))?;
        run_loader(id, &loader)
    }

    /// Starts resolving `id` on a worker thread. Unknown ids settle
    /// immediately with `NotFound`.
    pub fn resolve(&self, id: &ExhibitId) -> PendingUnit {
        let Some(loader) = self.loader_for(id) else {
            return PendingUnit::ready(Err(ExhibitError::NotFound(id.clone())));
        };

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let worker_id = id.clone();
        let spawned = thread::Builder::new()
            .name(format!("nova-load-{id}"))
            .spawn(move || {
                let result = run_loader(&worker_id, &loader);
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => PendingUnit::Threaded {
                id: id.clone(),
                receiver,
            },
            Err(err) => PendingUnit::ready(Err(ExhibitError::load(
                id,
                format!("could not start load worker: {err}"),
            ))),
        }
    }
}

fn run_loader(id: &ExhibitId, loader: &UnitLoader) -> Result<ExhibitUnit, ExhibitError> {
    let unit = loader()?;
    if unit.id() != id {
        return Err(ExhibitError::load(
            id,
            format!("loader produced exhibit '{}'", unit.id()),
        ));
    }
    debug!(exhibit = %id, controls = unit.controls.len(), "resolved exhibit unit");
    Ok(unit)
}

/// Result of `ExhibitRegistry::resolve`, handed out exactly once.
pub enum PendingUnit {
    Ready(Option<Result<ExhibitUnit, ExhibitError>>),
    Threaded {
        id: ExhibitId,
        receiver: Receiver<Result<ExhibitUnit, ExhibitError>>,
    },
}

impl PendingUnit {
    pub fn ready(result: Result<ExhibitUnit, ExhibitError>) -> Self {
        PendingUnit::Ready(Some(result))
    }

    /// Returns the result once it is available. Afterwards, and while the
    /// worker is still running, returns `None`.
    pub fn poll(&mut self) -> Option<Result<ExhibitUnit, ExhibitError>> {
        match self {
            PendingUnit::Ready(slot) => slot.take(),
            PendingUnit::Threaded { id, receiver } => match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(ExhibitError::load(
                    id,
                    "load worker exited before returning a result",
                ))),
            },
        }
    }

    /// Blocks up to `timeout` for the result.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<ExhibitUnit, ExhibitError>> {
        match self {
            PendingUnit::Ready(slot) => slot.take(),
            PendingUnit::Threaded { id, receiver } => match receiver.recv_timeout(timeout) {
                Ok(result) => Some(result),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Err(ExhibitError::load(
                    id,
                    "load worker exited before returning a result",
                ))),
            },
        }
    }
}
