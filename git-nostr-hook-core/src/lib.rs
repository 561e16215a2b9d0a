pub mod config;
pub mod error;
pub mod events;
pub mod facts;
pub mod hook;
pub mod install;
pub mod publish;
pub mod signer;
pub mod types;
pub mod url;

// Re-export main types and functions for convenience
pub use config::{
    ConfigSource, DEFAULT_RELAYS, GitConfigSource, MapConfig, PRIVKEY_KEY, default_relays,
};
pub use error::HookError;
pub use events::{
    AnnouncementDraft, Clock, FixedClock, KIND_GIT_REPO_ANNOUNCEMENT, SystemClock,
    build_announcement,
};
pub use facts::{FactSource, GitFacts, StaticFacts, collect_facts};
pub use hook::{HookContext, run_hook};
pub use publish::{NostrTransport, Transport, publish};
pub use signer::{parse_secret_key, sign};
pub use types::{
    BranchRef, DeliveryStage, PublishConfig, PublishReport, PublishResult, RelayOutcome,
    RelayResult, RepositoryFacts, RunOutcome,
};
