use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::install::{handle_install_command, handle_uninstall_command};
use commands::run::{RunArgs, handle_run_command};

#[derive(Parser)]
#[command(name = "git-nostr-hook")]
#[command(about = "Publish repository state to Nostr (NIP-34) on every commit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Announce the current repository state to Nostr relays
    Run(RunArgs),

    /// Install the global post-commit hook
    Install,

    /// Remove the global post-commit hook
    Uninstall,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with the hook's progress lines
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run_command(args).await,
        Commands::Install => handle_install_command(),
        Commands::Uninstall => handle_uninstall_command(),
    }
}
