mod cli;
mod config;
mod download;
mod error;
mod install;
mod manifest;
mod platform;
mod verify;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use error::InstallError;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let result = match cli.command {
        Commands::Version => {
            println!("relget v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        Commands::Install {
            manifest,
            install_dir,
        } => install::run_install(&manifest, install_dir)
            .await
            .map(|path| {
                println!("Installed to {}", path.display());
            }),

        Commands::Resolve { manifest } => resolve_command(&manifest),

        Commands::Validate { manifest } => validate_command(&manifest),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

fn resolve_command(manifest_path: &Path) -> Result<(), InstallError> {
    let manifest = manifest::load_manifest(manifest_path)?;
    let host = platform::detect_host();
    let entry = platform::resolve_release(&manifest, &host)?;

    println!(
        "{} {} ({}/{} {}-bit)",
        manifest.name, manifest.version, host.os, host.arch, host.bits
    );
    println!("  URL:    {}", entry.url);
    println!("  SHA256: {}", entry.sha256);
    println!("  Binary: {}", entry.binary);
    Ok(())
}

fn validate_command(manifest_path: &Path) -> Result<(), InstallError> {
    let manifest = manifest::load_manifest(manifest_path)?;
    println!(
        "{} {}: {} release entries, manifest OK",
        manifest.name,
        manifest.version,
        manifest.releases.len()
    );
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
