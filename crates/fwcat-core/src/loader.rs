//! Package loading: resolve one package on disk into validated catalog
//! entries.
//!
//! A package is normally a `.fwp` ZIP archive bundling the reserved
//! `manifest.toml` member with its payload files; an unpacked directory
//! holding the same layout is accepted too. In either form, payload sizes
//! are measured by fully reading each member - sizes declared anywhere in
//! the manifest are never trusted.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::catalog::CatalogEntry;
use crate::manifest::{MANIFEST_NAME, Manifest, ManifestError};

/// Filename suffix identifying firmware packages in the watched folder.
pub const PACKAGE_SUFFIX: &str = ".fwp";

/// Errors that fail loading of a whole package.
///
/// Any of these leaves the package's previous catalog contribution
/// untouched; a failed reload never deletes previously good state.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The package file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The package is not a readable ZIP archive.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The package has no metadata member at all.
    #[error("package contains no '{MANIFEST_NAME}' member")]
    MissingManifest,

    /// The metadata member is present but undecodable.
    #[error(transparent)]
    Malformed(#[from] ManifestError),
}

/// Why a single manifest entry was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A required identity field was empty.
    MissingField(&'static str),
    /// The referenced payload is not a member of the package.
    PayloadNotFound(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field '{field}' is empty"),
            Self::PayloadNotFound(file) => write!(f, "payload '{file}' not found in package"),
        }
    }
}

/// One manifest entry that failed validation, with its position.
#[derive(Debug, Clone)]
pub struct RejectedEntry {
    /// Zero-based position of the entry in the manifest.
    pub index: usize,
    /// What disqualified it.
    pub reason: RejectReason,
}

/// The outcome of loading one package: entries that passed validation and
/// the ones that were skipped.
#[derive(Debug, Default)]
pub struct PackageContents {
    /// Validated entries, in manifest order.
    pub entries: Vec<CatalogEntry>,
    /// Entries skipped by per-entry validation.
    pub rejected: Vec<RejectedEntry>,
}

/// Whether a path looks like a firmware package file.
pub fn is_package_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(PACKAGE_SUFFIX))
        .unwrap_or(false)
}

/// The name under which a package owns its catalog entries.
pub fn package_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Load one package into validated catalog entries.
///
/// Per-entry validation failures are partial-tolerant: the offending entry
/// is skipped and recorded in [`PackageContents::rejected`] while its
/// siblings still load.
///
/// # Errors
///
/// Fails with [`LoadError::MissingManifest`] / [`LoadError::Malformed`]
/// when the metadata member is absent or undecodable, and with
/// [`LoadError::Io`] / [`LoadError::Archive`] when the package cannot be
/// read at all.
pub fn load_package(path: &Path) -> Result<PackageContents, LoadError> {
    tracing::debug!("loading package '{}'", path.display());

    let (manifest_text, payload_sizes) = if path.is_dir() {
        read_directory_package(path)?
    } else {
        read_archive_package(path)?
    };

    let manifest = Manifest::parse(&manifest_text)?;
    Ok(validate(manifest, &payload_sizes, &package_name(path)))
}

/// Read a `.fwp` archive: extract the manifest text and measure every
/// other member by reading it to the end.
fn read_archive_package(path: &Path) -> Result<(String, HashMap<String, u64>), LoadError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut manifest_text = None;
    let mut payload_sizes = HashMap::new();

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_string();

        if name == MANIFEST_NAME {
            let mut text = String::new();
            member.read_to_string(&mut text)?;
            manifest_text = Some(text);
        } else {
            let size = io::copy(&mut member, &mut io::sink())?;
            payload_sizes.insert(name, size);
        }
    }

    match manifest_text {
        Some(text) => Ok((text, payload_sizes)),
        None => Err(LoadError::MissingManifest),
    }
}

/// Read an unpacked package directory: `manifest.toml` plus sibling
/// payload files.
fn read_directory_package(path: &Path) -> Result<(String, HashMap<String, u64>), LoadError> {
    let manifest_path = path.join(MANIFEST_NAME);
    if !manifest_path.is_file() {
        return Err(LoadError::MissingManifest);
    }
    let manifest_text = std::fs::read_to_string(&manifest_path)?;

    let mut payload_sizes = HashMap::new();
    for sibling in WalkDir::new(path).min_depth(1).max_depth(1) {
        let sibling = sibling.map_err(|err| LoadError::Io(err.into()))?;
        if !sibling.file_type().is_file() {
            continue;
        }
        let name = sibling.file_name().to_string_lossy().into_owned();
        if name == MANIFEST_NAME {
            continue;
        }
        let size = io::copy(&mut File::open(sibling.path())?, &mut io::sink())?;
        payload_sizes.insert(name, size);
    }

    Ok((manifest_text, payload_sizes))
}

fn validate(
    manifest: Manifest,
    payload_sizes: &HashMap<String, u64>,
    owning_package: &str,
) -> PackageContents {
    let mut contents = PackageContents::default();

    for (index, entry) in manifest.entries.into_iter().enumerate() {
        let reason = if entry.device_type.is_empty() {
            Some(RejectReason::MissingField("deviceType"))
        } else if entry.version.is_empty() {
            Some(RejectReason::MissingField("version"))
        } else if !payload_sizes.contains_key(&entry.file) {
            Some(RejectReason::PayloadNotFound(entry.file.clone()))
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::warn!("skipping entry {index} of '{owning_package}': {reason}");
            contents.rejected.push(RejectedEntry { index, reason });
            continue;
        }

        let payload_size = payload_sizes[&entry.file];
        contents.entries.push(CatalogEntry {
            device_type: entry.device_type,
            version: entry.version,
            prerequisite_version: entry.prerequisite_version,
            vendor: entry.vendor,
            model: entry.model,
            description: entry.description,
            hash: entry.hash,
            file: entry.file,
            owning_package: owning_package.to_string(),
            payload_size,
        });
    }

    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;

    fn manifest_entry(device_type: &str, version: &str, file: &str) -> ManifestEntry {
        ManifestEntry {
            device_type: device_type.to_string(),
            version: version.to_string(),
            file: file.to_string(),
            ..ManifestEntry::default()
        }
    }

    #[test]
    fn validate_skips_entries_with_empty_identity_fields() {
        let manifest = Manifest {
            entries: vec![
                manifest_entry("", "1.0", "a.bin"),
                manifest_entry("lamp", "", "a.bin"),
                manifest_entry("lamp", "1.0", "a.bin"),
            ],
        };
        let sizes = HashMap::from([("a.bin".to_string(), 4)]);

        let contents = validate(manifest, &sizes, "pkg.fwp");

        assert_eq!(contents.entries.len(), 1);
        assert_eq!(contents.rejected.len(), 2);
        assert_eq!(
            contents.rejected[0].reason,
            RejectReason::MissingField("deviceType")
        );
        assert_eq!(
            contents.rejected[1].reason,
            RejectReason::MissingField("version")
        );
    }

    #[test]
    fn validate_rejects_unknown_payload_references() {
        let manifest = Manifest {
            entries: vec![manifest_entry("lamp", "1.0", "ghost.bin")],
        };

        let contents = validate(manifest, &HashMap::new(), "pkg.fwp");

        assert!(contents.entries.is_empty());
        assert_eq!(
            contents.rejected[0].reason,
            RejectReason::PayloadNotFound("ghost.bin".to_string())
        );
    }

    #[test]
    fn validate_tags_entries_with_measured_size_and_owner() {
        let manifest = Manifest {
            entries: vec![manifest_entry("lamp", "1.0", "a.bin")],
        };
        let sizes = HashMap::from([("a.bin".to_string(), 100)]);

        let contents = validate(manifest, &sizes, "pkg.fwp");

        let entry = &contents.entries[0];
        assert_eq!(entry.payload_size, 100);
        assert_eq!(entry.owning_package, "pkg.fwp");
    }

    #[test]
    fn package_file_matching() {
        assert!(is_package_file(Path::new("/fw/a.fwp")));
        assert!(!is_package_file(Path::new("/fw/a.fwp.part")));
        assert!(!is_package_file(Path::new("/fw/notes.txt")));
    }
}
