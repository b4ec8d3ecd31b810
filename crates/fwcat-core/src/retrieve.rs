//! Payload retrieval: stream the exact bytes of a catalogued firmware
//! image back out of its owning package.
//!
//! Nothing is cached - every retrieval re-opens the package on disk, so
//! a payload read always reflects the file the catalog entry was loaded
//! from (or fails loudly if that file is gone).

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use bytes::{Buf, Bytes};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::catalog::CatalogEntry;

/// Errors surfaced to callers when a payload cannot be produced.
#[derive(Error, Debug)]
pub enum RetrieveError {
    /// The owning package could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The owning package is not a readable ZIP archive.
    #[error("archive error: {0}")]
    Archive(ZipError),

    /// The owning package or the payload member no longer exists.
    #[error("payload '{0}' not found")]
    PayloadNotFound(String),

    /// Fewer bytes were read than the catalog recorded at load time.
    /// No partial data is ever returned.
    #[error("payload '{file}' truncated: read {actual} of {expected} bytes")]
    TruncatedPayload {
        /// Payload member name.
        file: String,
        /// Byte count recorded in the catalog entry.
        expected: u64,
        /// Byte count actually read.
        actual: u64,
    },
}

/// A fully-read firmware payload.
#[derive(Debug, Clone)]
pub struct Payload {
    data: Bytes,
}

impl Payload {
    /// Exact byte count of the payload.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the payload as a sequentially-readable stream.
    pub fn reader(self) -> impl Read {
        self.data.reader()
    }

    /// Consume the payload as raw bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Re-open the entry's owning package under `folder` and read its payload.
///
/// # Errors
///
/// Fails with [`RetrieveError::PayloadNotFound`] when the package or the
/// member has vanished since the catalog was loaded, and with
/// [`RetrieveError::TruncatedPayload`] when the bytes read do not match
/// the recorded [`CatalogEntry::payload_size`].
pub fn open_payload(folder: &Path, entry: &CatalogEntry) -> Result<Payload, RetrieveError> {
    tracing::debug!(
        "retrieving payload '{}' ({} {}) from '{}'",
        entry.file,
        entry.device_type,
        entry.version,
        entry.owning_package
    );

    let package_path = folder.join(&entry.owning_package);
    let data = if package_path.is_dir() {
        read_directory_payload(&package_path, entry)?
    } else {
        read_archive_payload(&package_path, entry)?
    };

    if data.len() as u64 != entry.payload_size {
        return Err(RetrieveError::TruncatedPayload {
            file: entry.file.clone(),
            expected: entry.payload_size,
            actual: data.len() as u64,
        });
    }

    Ok(Payload { data: data.into() })
}

fn read_archive_payload(package_path: &Path, entry: &CatalogEntry) -> Result<Vec<u8>, RetrieveError> {
    let file = File::open(package_path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            RetrieveError::PayloadNotFound(entry.owning_package.clone())
        } else {
            RetrieveError::Io(err)
        }
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(RetrieveError::Archive)?;

    let mut member = match archive.by_name(&entry.file) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => {
            return Err(RetrieveError::PayloadNotFound(entry.file.clone()));
        }
        Err(err) => return Err(RetrieveError::Archive(err)),
    };

    let mut data = Vec::with_capacity(entry.payload_size as usize);
    member.read_to_end(&mut data)?;
    Ok(data)
}

fn read_directory_payload(
    package_path: &Path,
    entry: &CatalogEntry,
) -> Result<Vec<u8>, RetrieveError> {
    std::fs::read(package_path.join(&entry.file)).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            RetrieveError::PayloadNotFound(entry.file.clone())
        } else {
            RetrieveError::Io(err)
        }
    })
}
