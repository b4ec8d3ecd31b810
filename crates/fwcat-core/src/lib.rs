//! fwcat-core - a live, queryable catalog of versioned firmware packages.
//!
//! The engine watches a folder of `.fwp` packages (ZIP archives bundling
//! a `manifest.toml` with binary firmware payloads), keeps an in-memory
//! catalog keyed by (device type, version), and serves concurrent lookups
//! and payload retrieval while reconciling filesystem changes in the
//! background.
//!
//! # Architecture
//!
//! - **Single-writer reconciliation**: one background task performs the
//!   startup scan and all event-driven loads/purges, so catalog mutation
//!   is inherently serialized.
//! - **Per-package atomic replace**: a package's contribution is swapped
//!   as a whole under one write lock; readers never see a mix of old and
//!   new entries for the same package.
//! - **Measured, not trusted**: payload sizes come from fully reading the
//!   archive members at load time, and retrieval re-verifies the count.
//!
//! # Package layout
//!
//! ```text
//! <folder>/
//! ├── lamps.fwp           # ZIP archive
//! │   ├── manifest.toml   # [[firmware]] entries
//! │   ├── lamp-1.bin
//! │   └── lamp-2.bin
//! └── plugs.fwp
//! ```

pub mod catalog;
pub mod engine;
pub mod loader;
pub mod manifest;
pub mod retrieve;
pub mod watcher;

pub use catalog::{Catalog, CatalogEntry, FirmwareIdentity};
pub use engine::{DEFAULT_WATCH_GRACE, EngineError, EngineOptions, FirmwareEngine};
pub use loader::{
    LoadError, PACKAGE_SUFFIX, PackageContents, RejectReason, RejectedEntry, is_package_file,
    load_package, package_name,
};
pub use manifest::{MANIFEST_NAME, Manifest, ManifestEntry, ManifestError};
pub use retrieve::{Payload, RetrieveError, open_payload};
pub use watcher::{WatcherState, scan_folder};
