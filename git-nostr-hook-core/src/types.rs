use nostr::{EventId, PublicKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;

/// A branch head as discovered in the local repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Full ref name, e.g. `refs/heads/main`
    pub name: String,
    pub commit: String,
}

impl BranchRef {
    pub fn new(name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: commit.into(),
        }
    }
}

/// Repository facts gathered once per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFacts {
    pub name: String,
    pub remote_url: Option<String>,
    pub current_branch: String,
    pub commit_subject: Option<String>,
    /// Discovery order, duplicates kept
    pub branch_refs: Vec<BranchRef>,
}

/// Configuration for publishing
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Upper bound for each connect and each send
    pub timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// The step at which a relay attempt gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStage {
    Connect,
    Send,
}

/// Result of a single relay attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RelayOutcome {
    Delivered,
    Failed { stage: DeliveryStage, reason: String },
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RelayOutcome::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResult {
    pub relay: String,
    pub outcome: RelayOutcome,
}

/// Aggregated result of publishing to every configured relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub succeeded: usize,
    pub total: usize,
    /// Configured relay order
    pub relays: Vec<RelayResult>,
}

impl PublishReport {
    pub fn from_results(relays: Vec<RelayResult>) -> Self {
        let succeeded = relays.iter().filter(|r| r.outcome.is_delivered()).count();
        Self {
            succeeded,
            total: relays.len(),
            relays,
        }
    }

    /// True when relays were configured but none accepted the event
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

/// Result of publishing a signed announcement
#[derive(Debug, Serialize)]
pub struct PublishResult {
    pub event_id: EventId,
    pub pubkey: PublicKey,
    pub report: PublishReport,
}

/// What a hook invocation ended up doing
#[derive(Debug)]
pub enum RunOutcome {
    /// No secret key configured; nothing was built or sent
    Skipped,
    Published(PublishResult),
}
