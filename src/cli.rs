use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("RELGET_GIT_TAG") {
        return tag;
    }

    // Not on a tag - include commit hash and branch (dev build)
    let commit = option_env!("RELGET_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("RELGET_GIT_BRANCH").unwrap_or("unknown");

    // Return a static string by leaking the formatted string
    // This is safe because it only happens once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "relget")]
#[command(about = "Install prebuilt release binaries from a platform manifest")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, verify and install the release for this machine
    #[command(
        after_help = "Examples:\n  relget install manifests/covid.yaml\n  relget install covid.yaml --install-dir ~/bin\n  relget -v install covid.json"
    )]
    Install {
        /// Path to the release manifest (YAML or JSON)
        manifest: PathBuf,
        /// Directory to install into (defaults to ~/.local/bin)
        #[arg(long)]
        install_dir: Option<PathBuf>,
    },

    /// Show which release entry matches this machine
    Resolve {
        /// Path to the release manifest (YAML or JSON)
        manifest: PathBuf,
    },

    /// Check a manifest without downloading anything
    Validate {
        /// Path to the release manifest (YAML or JSON)
        manifest: PathBuf,
    },

    /// Show the current version
    Version,
}
