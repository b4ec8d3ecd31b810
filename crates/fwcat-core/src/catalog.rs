//! Concurrent catalog of firmware images keyed by device-type/version.
//!
//! The catalog is the only mutable shared state in the engine. All
//! mutation funnels through [`Catalog::upsert_all`] and [`Catalog::purge`]
//! so that a package's contribution is always replaced as a whole - a
//! reader can never observe half of an old load and half of a new one
//! for the same package.

use std::collections::HashMap;

use parking_lot::RwLock;

/// The (device type, version) pair uniquely addressing one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FirmwareIdentity {
    /// Identifier of the device type.
    pub device_type: String,
    /// Firmware version string.
    pub version: String,
}

impl FirmwareIdentity {
    /// Build an identity from its two components.
    pub fn new(device_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            device_type: device_type.into(),
            version: version.into(),
        }
    }
}

/// One firmware image: its manifest fields plus what the loader measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Identifier of the device type this image applies to.
    pub device_type: String,
    /// Firmware version string.
    pub version: String,
    /// Minimum version that must already be installed (advisory only).
    pub prerequisite_version: String,
    /// Hardware vendor name.
    pub vendor: String,
    /// Hardware model name.
    pub model: String,
    /// Free-text description of the image.
    pub description: String,
    /// Content checksum as published by the packager (carried, not verified).
    pub hash: String,
    /// Name of the payload member inside the owning package.
    pub file: String,
    /// File name of the package that supplied this entry.
    pub owning_package: String,
    /// Exact byte length measured by fully reading the payload at load time.
    pub payload_size: u64,
}

impl CatalogEntry {
    /// The identity under which this entry is keyed.
    pub fn identity(&self) -> FirmwareIdentity {
        FirmwareIdentity::new(self.device_type.clone(), self.version.clone())
    }
}

/// Concurrency-safe mapping from [`FirmwareIdentity`] to [`CatalogEntry`].
#[derive(Debug, Default)]
pub struct Catalog {
    entries: RwLock<HashMap<FirmwareIdentity, CatalogEntry>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contribution of one package.
    ///
    /// Under a single write lock, removes every entry owned by
    /// `owning_package` and then inserts `entries`. Entries are inserted
    /// in order, so a later entry with a colliding identity wins over an
    /// earlier one (and over any entry from a previously loaded package).
    pub fn upsert_all(&self, owning_package: &str, entries: Vec<CatalogEntry>) {
        let mut map = self.entries.write();
        map.retain(|_, entry| entry.owning_package != owning_package);
        for entry in entries {
            map.insert(entry.identity(), entry);
        }
    }

    /// Remove every entry owned by the given package.
    pub fn purge(&self, owning_package: &str) {
        tracing::debug!("purging catalog entries owned by '{owning_package}'");
        self.entries
            .write()
            .retain(|_, entry| entry.owning_package != owning_package);
    }

    /// Exact-key read.
    pub fn lookup(&self, identity: &FirmwareIdentity) -> Option<CatalogEntry> {
        self.entries.read().get(identity).cloned()
    }

    /// All entries for one device type, in no particular order.
    pub fn list_by_device_type(&self, device_type: &str) -> Vec<CatalogEntry> {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.device_type == device_type)
            .cloned()
            .collect()
    }

    /// A point-in-time copy of every entry, in no particular order.
    pub fn snapshot(&self) -> Vec<CatalogEntry> {
        self.entries.read().values().cloned().collect()
    }

    /// Number of entries currently catalogued.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(device_type: &str, version: &str, owner: &str) -> CatalogEntry {
        CatalogEntry {
            device_type: device_type.to_string(),
            version: version.to_string(),
            prerequisite_version: String::new(),
            vendor: String::new(),
            model: String::new(),
            description: String::new(),
            hash: String::new(),
            file: format!("{device_type}-{version}.bin"),
            owning_package: owner.to_string(),
            payload_size: 0,
        }
    }

    #[test]
    fn upsert_replaces_a_packages_contribution_wholesale() {
        let catalog = Catalog::new();
        catalog.upsert_all(
            "a.fwp",
            vec![entry("lamp", "1.0", "a.fwp"), entry("lamp", "2.0", "a.fwp")],
        );
        assert_eq!(catalog.len(), 2);

        // Reload with fewer entries: no duplicate accumulation.
        catalog.upsert_all("a.fwp", vec![entry("lamp", "3.0", "a.fwp")]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup(&FirmwareIdentity::new("lamp", "1.0")).is_none());
        assert!(catalog.lookup(&FirmwareIdentity::new("lamp", "3.0")).is_some());
    }

    #[test]
    fn purge_removes_only_the_target_package() {
        let catalog = Catalog::new();
        catalog.upsert_all("a.fwp", vec![entry("lamp", "1.0", "a.fwp")]);
        catalog.upsert_all("b.fwp", vec![entry("plug", "1.0", "b.fwp")]);

        catalog.purge("a.fwp");

        assert!(catalog.lookup(&FirmwareIdentity::new("lamp", "1.0")).is_none());
        assert!(catalog.lookup(&FirmwareIdentity::new("plug", "1.0")).is_some());
    }

    #[test]
    fn last_load_wins_on_identity_collision() {
        let catalog = Catalog::new();
        catalog.upsert_all("a.fwp", vec![entry("lamp", "2.0", "a.fwp")]);
        catalog.upsert_all("b.fwp", vec![entry("lamp", "2.0", "b.fwp")]);

        let found = catalog
            .lookup(&FirmwareIdentity::new("lamp", "2.0"))
            .unwrap();
        assert_eq!(found.owning_package, "b.fwp");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn list_by_device_type_filters() {
        let catalog = Catalog::new();
        catalog.upsert_all(
            "a.fwp",
            vec![
                entry("lamp", "1.0", "a.fwp"),
                entry("lamp", "2.0", "a.fwp"),
                entry("plug", "1.0", "a.fwp"),
            ],
        );

        let lamps = catalog.list_by_device_type("lamp");
        assert_eq!(lamps.len(), 2);
        assert!(lamps.iter().all(|e| e.device_type == "lamp"));
        assert!(catalog.list_by_device_type("lock").is_empty());
    }

    #[test]
    fn lookup_miss_is_none_not_error() {
        let catalog = Catalog::new();
        assert!(catalog.lookup(&FirmwareIdentity::new("lamp", "9.9")).is_none());
        assert!(catalog.is_empty());
    }
}
