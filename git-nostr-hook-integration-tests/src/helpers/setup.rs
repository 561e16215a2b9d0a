use anyhow::{Context, Result};
use nostr_sdk::Keys;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Test context that holds temporary directories and configuration
pub struct TestContext {
    pub temp_dir: TempDir,
    pub repo_path: PathBuf,
    pub home_dir: PathBuf,
    pub verbose: bool,
    pub keep_temp: bool,
}

impl TestContext {
    /// Create a new test context with temporary directories
    pub fn new(test_name: &str, verbose: bool, keep_temp: bool) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("{test_name}-"))
            .keep(keep_temp)
            .tempdir()?;

        let repo_path = temp_dir.path().join("test-repo");
        let home_dir = temp_dir.path().join("home");

        std::fs::create_dir_all(&repo_path)?;
        std::fs::create_dir_all(&home_dir)?;

        if verbose {
            println!("  📂 Test directory: {}", temp_dir.path().display());
        }

        Ok(Self {
            temp_dir,
            repo_path,
            home_dir,
            verbose,
            keep_temp,
        })
    }

    /// Directory outside any repository
    pub fn outside_dir(&self) -> Result<PathBuf> {
        let dir = self.temp_dir.path().join("outside");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Run git in the test repository with HOME pointed at the sandbox
    pub fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("HOME", &self.home_dir)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

        if !output.status.success() {
            anyhow::bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    /// Setup a git repository on `main` with initial commits
    pub fn setup_git_repo(&self, num_commits: usize) -> Result<()> {
        self.git(&["init", "--initial-branch", "main"])?;
        self.git(&["config", "user.email", "test@example.com"])?;
        self.git(&["config", "user.name", "Test User"])?;

        for i in 0..num_commits {
            let filename = format!("file{i}.txt");
            std::fs::write(self.repo_path.join(&filename), format!("Content {i}"))?;
            self.git(&["add", &filename])?;
            self.git(&["commit", "-m", &format!("Commit {i}")])?;
        }

        if self.verbose {
            println!("    ✓ Created git repo with {num_commits} commits");
        }

        Ok(())
    }

    pub fn set_origin(&self, url: &str) -> Result<()> {
        self.git(&["remote", "add", "origin", url])
    }

    /// Store the signing key in the repository's local config
    pub fn set_private_key(&self, key: &str) -> Result<()> {
        self.git(&["config", "nostr.privkey", key])
    }

    /// Store the signing key in the sandbox's global config
    pub fn set_global_private_key(&self, key: &str) -> Result<()> {
        let config = self.global_config();
        let config = config.to_string_lossy();
        self.git(&["config", "--file", &config, "nostr.privkey", key])
    }

    pub fn global_config(&self) -> PathBuf {
        self.home_dir.join(".gitconfig")
    }

    pub fn repo_path_str(&self) -> String {
        self.repo_path.to_string_lossy().to_string()
    }

    /// Generate a random 64-char hex secret key
    pub fn generate_test_key() -> String {
        Keys::generate().secret_key().to_secret_hex()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if self.keep_temp {
            println!(
                "  📌 Keeping test directory: {}",
                self.temp_dir.path().display()
            );
        }
    }
}
