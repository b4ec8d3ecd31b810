//! fwcat - firmware package catalog CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fwcat_cli::cmd;
use fwcat_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            folder,
            device_type,
        } => cmd::list::list(&folder, device_type.as_deref()),
        Commands::Inspect { package } => cmd::inspect::inspect(&package),
        Commands::Get {
            folder,
            device_type,
            version,
            output,
        } => cmd::get::get(&folder, &device_type, &version, output.as_deref()),
        Commands::Pack { dir, output } => cmd::pack::pack(&dir, output.as_deref()),
        Commands::Watch { folder } => cmd::watch::watch(&folder).await,
    }
}
