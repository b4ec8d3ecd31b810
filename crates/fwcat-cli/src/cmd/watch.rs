//! Watch command

use std::path::Path;

use anyhow::{Context, Result};

use fwcat_core::{EngineOptions, FirmwareEngine};

/// Run the engine against a folder until interrupted.
pub async fn watch(folder: &Path) -> Result<()> {
    let engine = FirmwareEngine::start(EngineOptions::new(folder))
        .await
        .with_context(|| format!("failed to start engine for '{}'", folder.display()))?;

    let entries = engine.entries();
    println!(
        "Catalogued {} firmware image(s) from '{}'. Watching - Ctrl-C to stop.",
        entries.len(),
        engine.folder().display()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    engine.stop().await;
    println!("Stopped.");
    Ok(())
}
