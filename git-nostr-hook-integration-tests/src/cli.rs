use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "git-nostr-hook-integration-tests")]
#[command(about = "Integration test suite for git-nostr-hook")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run all integration tests
    All {
        /// Show verbose output
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Keep temporary directories after tests
        #[arg(long)]
        keep_temp: bool,
    },

    /// Run publish tests against a local relay
    Hook {
        /// Show verbose output
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Keep temporary directories after tests
        #[arg(long)]
        keep_temp: bool,
    },

    /// Run install and uninstall tests
    Install {
        /// Show verbose output
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Keep temporary directories after tests
        #[arg(long)]
        keep_temp: bool,
    },
}
