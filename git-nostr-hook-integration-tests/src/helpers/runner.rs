use anyhow::{Context, Result};
use assert_cmd::Command;
use std::path::Path;

use crate::helpers::{PublishOutput, RunOutput};

/// Runner for git-nostr-hook commands inside a sandboxed HOME
pub struct HookRunner {
    verbose: bool,
    home_dir: String,
}

impl HookRunner {
    pub fn new(home_dir: &Path, verbose: bool) -> Self {
        Self {
            verbose,
            home_dir: home_dir.to_string_lossy().to_string(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("git-nostr-hook").unwrap_or_else(|_| {
            // Fallback to building the binary from the workspace
            let mut cmd = Command::new("cargo");
            cmd.args([
                "run",
                "--quiet",
                "--manifest-path",
                concat!(env!("CARGO_MANIFEST_DIR"), "/../Cargo.toml"),
                "--bin",
                "git-nostr-hook",
                "--",
            ]);
            cmd
        });

        cmd.env("HOME", &self.home_dir)
            .env("XDG_CONFIG_HOME", Path::new(&self.home_dir).join(".config"))
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env_remove("NOSTR_HOOK_RELAYS")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run a git-nostr-hook command with arguments
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        if self.verbose {
            println!("    $ git-nostr-hook {}", args.join(" "));
        }

        let output = self.command().args(args).output()?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if self.verbose {
            if !result.stderr.is_empty() {
                println!("      stderr: {}", result.stderr.trim());
            }
            if !result.stdout.is_empty() {
                println!("      stdout: {}", result.stdout.trim());
            }
        }

        Ok(result)
    }

    /// Run a command expecting exit status 0
    pub fn run_success(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if !output.success {
            anyhow::bail!(
                "Command failed: git-nostr-hook {}\nstderr: {}\nstdout: {}",
                args.join(" "),
                output.stderr,
                output.stdout
            );
        }
        Ok(output)
    }

    /// Run a command expecting a non-zero exit status
    pub fn run_failure(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if output.success {
            anyhow::bail!(
                "Command unexpectedly succeeded: git-nostr-hook {}\nstdout: {}",
                args.join(" "),
                output.stdout
            );
        }
        Ok(output)
    }
}

/// Command output structure
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Parse stdout as JSON
    pub fn stdout_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.stdout)
            .with_context(|| format!("Failed to parse JSON from stdout: {}", self.stdout))
    }

    /// Parse the `run --output json` document, requiring a published event
    pub fn parse_publish_output(&self) -> Result<PublishOutput> {
        match self.stdout_json::<RunOutput>()? {
            RunOutput::Published(output) => Ok(output),
            RunOutput::Skipped { reason } => {
                anyhow::bail!("Expected a published event, run was skipped: {reason}")
            }
        }
    }
}
