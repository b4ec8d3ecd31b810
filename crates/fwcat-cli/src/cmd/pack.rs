//! Pack command

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use fwcat_core::{MANIFEST_NAME, load_package};

/// Build a `.fwp` package from an unpacked package directory.
///
/// The directory is loaded first, so a broken manifest or a dangling
/// payload reference fails the pack instead of producing a package the
/// engine would reject entry by entry.
pub fn pack(dir: &Path, output: Option<&Path>) -> Result<()> {
    if !dir.is_dir() {
        bail!("'{}' is not a directory", dir.display());
    }

    let contents =
        load_package(dir).with_context(|| format!("failed to load '{}'", dir.display()))?;
    for rejected in &contents.rejected {
        tracing::warn!("entry {} would be skipped: {}", rejected.index, rejected.reason);
    }
    if contents.entries.is_empty() {
        bail!("'{}' contains no valid firmware entries", dir.display());
    }

    let default_output = dir.with_extension("fwp");
    let output = output.unwrap_or(&default_output);

    let file = File::create(output)
        .with_context(|| format!("failed to create '{}'", output.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    // Manifest first, then every sibling payload file.
    writer.start_file(MANIFEST_NAME, options)?;
    io::copy(&mut File::open(dir.join(MANIFEST_NAME))?, &mut writer)?;

    let mut members = 0usize;
    for sibling in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let sibling = sibling?;
        if !sibling.file_type().is_file() {
            continue;
        }
        let name = sibling.file_name().to_string_lossy().into_owned();
        if name == MANIFEST_NAME {
            continue;
        }
        writer.start_file(name, options)?;
        io::copy(&mut File::open(sibling.path())?, &mut writer)?;
        members += 1;
    }
    writer.finish()?;

    println!(
        "Packed {} entr{} ({members} payload file(s)) into '{}'",
        contents.entries.len(),
        if contents.entries.len() == 1 { "y" } else { "ies" },
        output.display()
    );
    Ok(())
}
