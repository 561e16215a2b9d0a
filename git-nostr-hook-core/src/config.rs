use anyhow::Result;
use git2::{Config, ErrorCode, Repository};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Git config key holding the hex secret key
pub const PRIVKEY_KEY: &str = "nostr.privkey";

pub const DEFAULT_RELAYS: [&str; 3] = [
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
];

pub fn default_relays() -> Vec<String> {
    DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect()
}

/// Key-value configuration lookup
pub trait ConfigSource {
    /// Returns `None` for missing or blank values
    fn get(&self, key: &str) -> Option<String>;
}

/// Configuration read through git's layered config files
pub struct GitConfigSource {
    config: Config,
}

impl GitConfigSource {
    /// Repository config layered over global and system config.
    ///
    /// Outside a repository only the global and system levels are read.
    pub fn for_path(path: &Path) -> Result<Self> {
        let config = match Repository::discover(path) {
            Ok(repo) => repo.config()?,
            Err(_) => Config::open_default()?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigSource for GitConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        match self.config.get_string(key) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                if e.code() != ErrorCode::NotFound {
                    warn!("Failed to read git config {key}: {}", e.message());
                }
                None
            }
        }
    }
}

/// In-memory configuration
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}
