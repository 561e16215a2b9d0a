use tracing::{debug, info};

use crate::config::{ConfigSource, PRIVKEY_KEY};
use crate::error::HookError;
use crate::events::{Clock, build_announcement};
use crate::facts::{FactSource, collect_facts};
use crate::publish::{Transport, publish};
use crate::signer::{parse_secret_key, sign};
use crate::types::*;

/// Everything a hook run reads from or talks to
pub struct HookContext<'a, T: Transport> {
    pub facts: &'a dyn FactSource,
    pub config: &'a dyn ConfigSource,
    pub clock: &'a dyn Clock,
    pub transport: &'a T,
    pub relays: &'a [String],
    pub publish: PublishConfig,
}

/// Announce the current repository state to the configured relays.
///
/// The key is checked, facts gathered and the event signed before any relay
/// is contacted. Relay failures only show up in the returned report.
pub async fn run_hook<T: Transport>(ctx: &HookContext<'_, T>) -> Result<RunOutcome, HookError> {
    let Some(secret) = ctx.config.get(PRIVKEY_KEY) else {
        info!("No {PRIVKEY_KEY} configured, skipping announcement");
        return Ok(RunOutcome::Skipped);
    };

    let keys = parse_secret_key(&secret)?;
    drop(secret);

    let facts = collect_facts(ctx.facts)?;
    debug!("Building announcement for {}", facts.name);

    let draft = build_announcement(&facts, ctx.clock);
    let event = sign(draft, &keys)?;
    drop(keys);
    info!("Signed announcement {} as {}", event.id, event.pubkey);

    let report = publish(&event, ctx.relays, ctx.transport, &ctx.publish).await;

    Ok(RunOutcome::Published(PublishResult {
        event_id: event.id,
        pubkey: event.pubkey,
        report,
    }))
}
