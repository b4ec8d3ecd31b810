//! Engine facade: ties the catalog, watcher and retriever together
//! behind the provider-facing API.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use crate::catalog::{Catalog, CatalogEntry, FirmwareIdentity};
use crate::retrieve::{self, Payload, RetrieveError};
use crate::watcher::{self, WatcherHandle, WatcherState};

/// Grace period between the startup scan and event subscription, giving
/// an external process time to finish writing packages.
pub const DEFAULT_WATCH_GRACE: Duration = Duration::from_secs(5);

/// Errors that can occur while starting the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The package folder could not be created or accessed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration for [`FirmwareEngine::start`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    folder: PathBuf,
    watch_grace: Duration,
}

impl EngineOptions {
    /// Options for watching the given package folder, with defaults.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            watch_grace: DEFAULT_WATCH_GRACE,
        }
    }

    /// Override the grace period between scan and watch.
    pub fn watch_grace(mut self, grace: Duration) -> Self {
        self.watch_grace = grace;
        self
    }
}

/// A running firmware catalog engine.
///
/// Owns the catalog exclusively; all mutation happens on the engine's
/// background task while queries run on arbitrary caller tasks.
#[derive(Debug)]
pub struct FirmwareEngine {
    folder: PathBuf,
    catalog: Arc<Catalog>,
    state_rx: watch::Receiver<WatcherState>,
    watcher: Mutex<Option<WatcherHandle>>,
}

impl FirmwareEngine {
    /// Start the engine: create the folder if absent, scan it, then begin
    /// watching in the background.
    ///
    /// When this returns, every package present at startup has been
    /// reconciled into the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the package folder cannot be created.
    pub async fn start(options: EngineOptions) -> Result<Self, EngineError> {
        tracing::debug!("starting engine for '{}'", options.folder.display());
        tokio::fs::create_dir_all(&options.folder).await?;

        let catalog = Arc::new(Catalog::new());
        let (state_tx, state_rx) = watch::channel(WatcherState::Idle);
        let handle = watcher::spawn(
            options.folder.clone(),
            Arc::clone(&catalog),
            options.watch_grace,
            state_tx,
        )
        .await;

        Ok(Self {
            folder: options.folder,
            catalog,
            state_rx,
            watcher: Mutex::new(Some(handle)),
        })
    }

    /// Stop watching and wait for the background task to exit. After this
    /// returns the catalog receives no further mutations. Idempotent.
    pub async fn stop(&self) {
        let handle = self.watcher.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    /// Exact lookup by (device type, version).
    pub fn find_by_identity(&self, device_type: &str, version: &str) -> Option<CatalogEntry> {
        self.catalog
            .lookup(&FirmwareIdentity::new(device_type, version))
    }

    /// All catalogued firmware for one device type, in no particular order.
    pub fn find_all_by_device_type(&self, device_type: &str) -> Vec<CatalogEntry> {
        self.catalog.list_by_device_type(device_type)
    }

    /// Read the entry's payload bytes out of its owning package.
    ///
    /// # Errors
    ///
    /// See [`RetrieveError`]; a vanished package or member surfaces as
    /// [`RetrieveError::PayloadNotFound`], never as an empty payload.
    pub fn open_payload(&self, entry: &CatalogEntry) -> Result<Payload, RetrieveError> {
        retrieve::open_payload(&self.folder, entry)
    }

    /// A point-in-time copy of every catalogued entry.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.catalog.snapshot()
    }

    /// Observe watcher lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<WatcherState> {
        self.state_rx.clone()
    }

    /// The folder this engine serves packages from.
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}
