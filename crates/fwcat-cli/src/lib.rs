//! fwcat - firmware package catalog CLI
#![allow(missing_docs)]
//!
//! Operator tooling over the `fwcat-core` engine: inspect and pack
//! firmware packages, query a package folder, extract payloads, and run
//! the live watcher.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod cmd;

#[derive(Debug, Parser)]
#[command(name = "fwcat", version, about = "Firmware package catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all firmware catalogued in a package folder
    List {
        /// Folder containing .fwp packages
        folder: PathBuf,
        /// Only show firmware for this device type
        #[arg(short, long)]
        device_type: Option<String>,
    },
    /// Show the contents of a single package
    Inspect {
        /// Package file (or unpacked package directory)
        package: PathBuf,
    },
    /// Extract one firmware payload
    Get {
        /// Folder containing .fwp packages
        folder: PathBuf,
        /// Device type identifier
        device_type: String,
        /// Firmware version
        version: String,
        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a .fwp package from an unpacked package directory
    Pack {
        /// Directory containing manifest.toml and payload files
        dir: PathBuf,
        /// Output package path (defaults to <dir>.fwp)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Watch a package folder and log catalog changes until interrupted
    Watch {
        /// Folder containing .fwp packages
        folder: PathBuf,
    },
}
