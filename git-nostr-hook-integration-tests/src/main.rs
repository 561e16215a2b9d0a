use anyhow::Result;
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

mod cli;
mod helpers;
mod relay;

use cli::Cli;
use relay::RelayManager;
use tests::{hook, install};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        cli::Commands::All { verbose, keep_temp } => run_all_tests(verbose, keep_temp).await,
        cli::Commands::Hook { verbose, keep_temp } => run_hook_tests(verbose, keep_temp).await,
        cli::Commands::Install { verbose, keep_temp } => {
            run_install_tests(verbose, keep_temp).await
        }
    }
}

async fn run_all_tests(verbose: bool, keep_temp: bool) -> Result<()> {
    println!("{}", "🧪 Running all git-nostr-hook integration tests...".bold());
    println!();

    let mut total_tests = 0;
    let mut failed_tests = 0;

    println!("{}", "📡 Publish Tests".blue().bold());
    let relay = RelayManager::start(verbose).await?;
    let (passed, failed) = hook::run_tests(verbose, keep_temp, &relay.get_url()).await?;
    total_tests += passed + failed;
    failed_tests += failed;

    println!();
    println!("{}", "🪝 Install Tests".blue().bold());
    let (passed, failed) = install::run_tests(verbose, keep_temp).await?;
    total_tests += passed + failed;
    failed_tests += failed;

    println!();
    println!("{}", "═".repeat(60).blue());
    if failed_tests == 0 {
        println!(
            "{} {} tests passed!",
            "✅".green(),
            format!("All {total_tests}").green().bold()
        );
    } else {
        println!(
            "{} {} tests passed, {} failed",
            "❌".red(),
            (total_tests - failed_tests).to_string().green(),
            failed_tests.to_string().red().bold()
        );
        std::process::exit(1);
    }

    Ok(())
}

async fn run_hook_tests(verbose: bool, keep_temp: bool) -> Result<()> {
    println!("{}", "📡 Running Publish Tests".blue().bold());
    let relay = RelayManager::start(verbose).await?;
    let (passed, failed) = hook::run_tests(verbose, keep_temp, &relay.get_url()).await?;
    print_test_summary(passed, failed);
    Ok(())
}

async fn run_install_tests(verbose: bool, keep_temp: bool) -> Result<()> {
    println!("{}", "🪝 Running Install Tests".blue().bold());
    let (passed, failed) = install::run_tests(verbose, keep_temp).await?;
    print_test_summary(passed, failed);
    Ok(())
}

fn print_test_summary(passed: usize, failed: usize) {
    println!();
    if failed == 0 {
        println!(
            "{} {} tests passed!",
            "✅".green(),
            passed.to_string().green().bold()
        );
    } else {
        println!(
            "{} {} tests passed, {} failed",
            "❌".red(),
            passed.to_string().green(),
            failed.to_string().red().bold()
        );
        std::process::exit(1);
    }
}
