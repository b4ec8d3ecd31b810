//! Folder watching and catalog reconciliation.
//!
//! One background task owns the whole reconciliation lifecycle: the
//! startup scan, a short grace period (so packages still being written
//! when the engine starts are not read half-finished), then a blocking
//! wait on filesystem change notifications. Every load and purge runs
//! sequentially on that task, so reconciliation is race-free with
//! respect to itself; readers go through the catalog's own locking.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::loader::{is_package_file, load_package, package_name};

/// Lifecycle of the reconciliation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Not started yet.
    Idle,
    /// Startup scan of the package folder is in progress.
    Scanning,
    /// Subscribed to filesystem notifications.
    Watching,
    /// Shut down (or failed); the catalog receives no further mutations.
    Stopped,
}

/// Handle to the spawned reconciliation task.
#[derive(Debug)]
pub(crate) struct WatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Cooperatively stop the task and wait for it to exit.
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Run the startup scan, then spawn the watch loop.
///
/// Returns once the scan has completed and the initial catalog state is
/// visible to readers; the grace period and event subscription happen on
/// the background task.
pub(crate) async fn spawn(
    folder: PathBuf,
    catalog: Arc<Catalog>,
    grace: Duration,
    state_tx: watch::Sender<WatcherState>,
) -> WatcherHandle {
    let _ = state_tx.send(WatcherState::Scanning);
    scan_folder(&folder, &catalog);

    let cancel = CancellationToken::new();
    let task = tokio::spawn(watch_loop(
        folder,
        catalog,
        grace,
        state_tx,
        cancel.clone(),
    ));
    WatcherHandle { cancel, task }
}

/// Load every package file in the folder into the catalog.
pub fn scan_folder(folder: &Path, catalog: &Catalog) {
    tracing::debug!("scanning package folder '{}'", folder.display());
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable folder entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_package_file(entry.path()) {
            reconcile(catalog, entry.path());
        }
    }
}

/// Load one package and replace its catalog contribution.
///
/// On load failure the catalog keeps whatever that package contributed
/// before: a broken rewrite must never delete previously good state.
fn reconcile(catalog: &Catalog, path: &Path) {
    match load_package(path) {
        Ok(contents) => {
            tracing::debug!(
                "loaded package '{}': {} entries, {} rejected",
                path.display(),
                contents.entries.len(),
                contents.rejected.len()
            );
            catalog.upsert_all(&package_name(path), contents.entries);
        }
        Err(err) => {
            tracing::error!("failed to load package '{}': {err}", path.display());
        }
    }
}

async fn watch_loop(
    folder: PathBuf,
    catalog: Arc<Catalog>,
    grace: Duration,
    state_tx: watch::Sender<WatcherState>,
    cancel: CancellationToken,
) {
    // Grace period between scan and watch, interruptible by shutdown.
    tokio::select! {
        _ = cancel.cancelled() => {
            let _ = state_tx.send(WatcherState::Stopped);
            return;
        }
        _ = tokio::time::sleep(grace) => {}
    }

    // Notification callbacks arrive on notify's own thread; bridge them
    // onto this task through a channel.
    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(64);
    let mut watcher = match notify::recommended_watcher(move |event| {
        let _ = event_tx.blocking_send(event);
    }) {
        Ok(watcher) => watcher,
        Err(err) => {
            tracing::error!("failed to create folder watcher: {err}");
            let _ = state_tx.send(WatcherState::Stopped);
            return;
        }
    };
    if let Err(err) = watcher.watch(&folder, RecursiveMode::NonRecursive) {
        tracing::error!("failed to watch '{}': {err}", folder.display());
        let _ = state_tx.send(WatcherState::Stopped);
        return;
    }

    let _ = state_tx.send(WatcherState::Watching);
    tracing::debug!("watching package folder '{}'", folder.display());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = event_rx.recv() => match event {
                Some(Ok(event)) => handle_event(&catalog, &event),
                Some(Err(err)) => {
                    // Watcher failure is not process-fatal: the catalog
                    // keeps its last known state, updates stop.
                    tracing::error!("folder watcher error: {err}");
                    break;
                }
                None => {
                    tracing::error!("folder watcher channel closed");
                    break;
                }
            },
        }
    }

    drop(watcher);
    let _ = state_tx.send(WatcherState::Stopped);
    tracing::debug!("stopped watching '{}'", folder.display());
}

fn handle_event(catalog: &Catalog, event: &Event) {
    for path in &event.paths {
        if !is_package_file(path) {
            continue;
        }
        tracing::debug!("event {:?} for '{}'", event.kind, path.display());
        match event.kind {
            EventKind::Remove(_) => catalog.purge(&package_name(path)),
            EventKind::Access(_) => {}
            // Create, modify, or anything else touching a package file:
            // always reconcile, never diff.
            _ => reconcile(catalog, path),
        }
    }
}
