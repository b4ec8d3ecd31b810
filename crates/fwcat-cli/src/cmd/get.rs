//! Get command

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use fwcat_core::{Catalog, open_payload, scan_folder};

/// Look up one firmware image and write its payload bytes out.
pub fn get(
    folder: &Path,
    device_type: &str,
    version: &str,
    output: Option<&Path>,
) -> Result<()> {
    if !folder.is_dir() {
        bail!("'{}' is not a folder", folder.display());
    }
    let folder = folder
        .canonicalize()
        .with_context(|| format!("failed to resolve '{}'", folder.display()))?;

    let catalog = Catalog::new();
    scan_folder(&folder, &catalog);

    let Some(entry) = catalog.lookup(&fwcat_core::FirmwareIdentity::new(device_type, version))
    else {
        bail!("no firmware catalogued for {device_type} {version}");
    };

    let payload = open_payload(&folder, &entry).with_context(|| {
        format!(
            "failed to read payload '{}' from '{}'",
            entry.file, entry.owning_package
        )
    })?;
    let size = payload.len();

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?;
            io::copy(&mut payload.reader(), &mut file)?;
            println!("Wrote {size} bytes to '{}'", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            io::copy(&mut payload.reader(), &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
