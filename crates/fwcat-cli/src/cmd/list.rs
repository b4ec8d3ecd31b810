//! List command

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;

use fwcat_core::{Catalog, CatalogEntry, scan_folder};

/// Scan a package folder once and print every catalogued firmware image.
pub fn list(folder: &Path, device_type: Option<&str>) -> Result<()> {
    if !folder.is_dir() {
        bail!("'{}' is not a folder", folder.display());
    }
    let folder = folder
        .canonicalize()
        .with_context(|| format!("failed to resolve '{}'", folder.display()))?;

    let catalog = Catalog::new();
    scan_folder(&folder, &catalog);

    let mut entries = match device_type {
        Some(device_type) => catalog.list_by_device_type(device_type),
        None => catalog.snapshot(),
    };

    if entries.is_empty() {
        println!("No firmware found in '{}'.", folder.display());
        return Ok(());
    }

    // Catalog order is unspecified; sort for stable output.
    entries.sort_by(|a, b| {
        (&a.device_type, &a.version, &a.owning_package)
            .cmp(&(&b.device_type, &b.version, &b.owning_package))
    });

    println!("{}", render_table(&entries));
    println!("{} firmware image(s)", entries.len());
    Ok(())
}

fn render_table(entries: &[CatalogEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["DEVICE TYPE", "VERSION", "VENDOR", "MODEL", "SIZE", "PACKAGE"]);
    for entry in entries {
        table.add_row([
            entry.device_type.as_str(),
            entry.version.as_str(),
            entry.vendor.as_str(),
            entry.model.as_str(),
            &entry.payload_size.to_string(),
            entry.owning_package.as_str(),
        ]);
    }
    table
}
