//! Inspect command

use std::path::Path;

use anyhow::{Context, Result};

use fwcat_core::load_package;

/// Load one package and print its validated entries and rejects.
pub fn inspect(package: &Path) -> Result<()> {
    let contents = load_package(package)
        .with_context(|| format!("failed to load '{}'", package.display()))?;

    println!();
    println!("  {}", package.display());
    println!();

    if contents.entries.is_empty() {
        println!("  No valid firmware entries.");
    }
    for entry in &contents.entries {
        println!(
            "  {} {}  ({} bytes in '{}')",
            entry.device_type, entry.version, entry.payload_size, entry.file
        );
        if !entry.vendor.is_empty() || !entry.model.is_empty() {
            println!("      vendor: {}  model: {}", entry.vendor, entry.model);
        }
        if !entry.description.is_empty() {
            println!("      {}", entry.description);
        }
        if !entry.prerequisite_version.is_empty() {
            println!("      requires: {}", entry.prerequisite_version);
        }
    }

    if !contents.rejected.is_empty() {
        println!();
        for rejected in &contents.rejected {
            println!("  skipped entry {}: {}", rejected.index, rejected.reason);
        }
    }

    println!();
    Ok(())
}
