use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use git_nostr_hook_core::{
    GitConfigSource, GitFacts, HookContext, HookError, NostrTransport, PRIVKEY_KEY,
    PublishConfig, PublishResult, RelayOutcome, RunOutcome, SystemClock, default_relays,
    run_hook,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Repository path (default: current directory)
    #[arg(long, default_value = ".")]
    pub repo_path: PathBuf,

    /// Nostr relays (can be specified multiple times)
    #[arg(long = "relay", env = "NOSTR_HOOK_RELAYS", value_delimiter = ',')]
    pub relays: Vec<String>,

    /// Seconds each relay gets to connect and acknowledge the event
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum JsonOutput<'a> {
    Skipped { reason: String },
    Published(&'a PublishResult),
}

pub async fn handle_run_command(args: RunArgs) -> Result<()> {
    let relays = if args.relays.is_empty() {
        default_relays()
    } else {
        args.relays
    };
    debug!("Running hook for {} with relays {:?}", args.repo_path.display(), relays);

    let facts = GitFacts::discover(&args.repo_path);
    let config = GitConfigSource::for_path(&args.repo_path).context("Failed to read git config")?;
    let publish = PublishConfig {
        timeout: Duration::from_secs(args.timeout),
    };
    let transport = NostrTransport::new(publish.timeout);

    let ctx = HookContext {
        facts: &facts,
        config: &config,
        clock: &SystemClock,
        transport: &transport,
        relays: &relays,
        publish,
    };

    if let OutputFormat::Human = args.output {
        println!("\n📡 git-nostr-hook\n");
    }

    match run_hook(&ctx).await {
        Ok(RunOutcome::Published(result)) => {
            print_published(&result, args.output)?;
            Ok(())
        }
        Ok(RunOutcome::Skipped) => {
            print_skipped(
                &format!("No {PRIVKEY_KEY} configured"),
                args.output,
                true,
            )?;
            Ok(())
        }
        // A bad key skips this run without failing the commit
        Err(e @ HookError::Configuration(_)) => {
            warn!("{e}");
            print_skipped(&e.to_string(), args.output, false)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_skipped(reason: &str, output: OutputFormat, show_setup: bool) -> Result<()> {
    match output {
        OutputFormat::Human => {
            let line = format!("⚠ {reason}. Skipping.");
            if show_setup {
                println!("{line}");
                println!("  Set with: git config {PRIVKEY_KEY} <hex-key>");
            } else {
                eprintln!("{line}");
            }
        }
        OutputFormat::Json => {
            let json = JsonOutput::Skipped {
                reason: reason.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

fn print_published(result: &PublishResult, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Human => {
            println!("Event ID: {}", result.event_id);
            println!("Pubkey: {}", result.pubkey);
            println!();

            for relay in &result.report.relays {
                match &relay.outcome {
                    RelayOutcome::Delivered => println!("✓ Published to {}", relay.relay),
                    RelayOutcome::Failed { stage, reason } => {
                        println!("✗ Failed {} ({stage}): {reason}", relay.relay)
                    }
                }
            }

            println!(
                "\n✓ Published to {succeeded}/{total} relays\n",
                succeeded = result.report.succeeded,
                total = result.report.total
            );
            if result.report.all_failed() {
                println!("⚠ No relay accepted the event; it will be sent again on the next commit");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&JsonOutput::Published(result))?
            );
        }
    }
    Ok(())
}
