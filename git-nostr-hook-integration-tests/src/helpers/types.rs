use serde::Deserialize;

/// JSON printed by `git-nostr-hook run --output json`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutput {
    Skipped { reason: String },
    Published(PublishOutput),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishOutput {
    pub event_id: String,
    pub pubkey: String,
    pub report: ReportOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportOutput {
    pub succeeded: usize,
    pub total: usize,
    pub relays: Vec<RelayOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayOutput {
    pub relay: String,
    pub outcome: OutcomeOutput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeOutput {
    Delivered,
    Failed { stage: String, reason: String },
}

impl ReportOutput {
    /// Outcome for one relay, matched by the URL it was configured with
    pub fn outcome_for(&self, relay: &str) -> Option<&OutcomeOutput> {
        self.relays
            .iter()
            .find(|r| r.relay == relay)
            .map(|r| &r.outcome)
    }
}
