use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info};

const RELAY_PORT: u16 = 7878;

/// A local nostr-rs-relay the hook can publish to
pub struct RelayManager {
    // Held so kill_on_drop stops the relay with the manager
    _process: Option<Child>,
    port: u16,
    _data_dir: Option<tempfile::TempDir>,
}

impl RelayManager {
    /// Start a relay, or reuse one already listening on the test port
    pub async fn start(verbose: bool) -> Result<Self> {
        let port = RELAY_PORT;

        if Self::is_port_open(port).await {
            info!("Found existing relay on port {}", port);
            if verbose {
                println!("  ℹ️  Using existing relay on port {port}");
            }
            return Ok(Self {
                _process: None,
                port,
                _data_dir: None,
            });
        }

        let config_path = Self::config_path();
        if !config_path.exists() {
            anyhow::bail!("Relay config not found at {}", config_path.display());
        }

        let data_dir =
            tempfile::tempdir().context("Failed to create temporary directory for relay data")?;
        std::fs::create_dir_all(data_dir.path().join("test-relay-data"))
            .context("Failed to create database directory")?;
        debug!("Relay data directory at {:?}", data_dir.path());

        if verbose {
            println!("  🚀 Starting nostr-rs-relay on port {port}...");
            println!("     Config: {}", config_path.display());
        }

        let process = Command::new("nostr-rs-relay")
            .arg("--config")
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .current_dir(data_dir.path())
            .stdout(std::process::Stdio::null())
            .stderr(if verbose {
                std::process::Stdio::inherit()
            } else {
                std::process::Stdio::null()
            })
            .kill_on_drop(true)
            .spawn()
            .context("Failed to start nostr-rs-relay. Make sure it is on PATH")?;

        Self::wait_for_ready(port).await?;
        info!("Relay is ready on port {}", port);

        Ok(Self {
            _process: Some(process),
            port,
            _data_dir: Some(data_dir),
        })
    }

    fn config_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("relay-config.toml")
    }

    async fn is_port_open(port: u16) -> bool {
        tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .is_ok()
    }

    async fn wait_for_ready(port: u16) -> Result<()> {
        for _ in 0..30 {
            if Self::is_port_open(port).await {
                return Ok(());
            }
            sleep(Duration::from_secs(1)).await;
        }
        anyhow::bail!("Relay failed to start within 30 seconds")
    }

    pub fn get_url(&self) -> String {
        format!("ws://localhost:{}", self.port)
    }
}
