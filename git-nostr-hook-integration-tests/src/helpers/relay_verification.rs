use anyhow::{Context, Result};
use nostr_sdk::{Client, EventId, Filter, Keys, RelayUrl};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const KIND_GIT_REPO_ANNOUNCEMENT: u16 = 30617;

/// Fetch an announcement back from a relay and check its kind and `d` tag
pub async fn verify_announcement_on_relay(
    event_id: &str,
    relay_url: &str,
    expected_identifier: &str,
    max_retries: u32,
) -> Result<()> {
    let event_id = EventId::from_hex(event_id).context("Invalid event id in hook output")?;
    debug!("Verifying event {} on relay {}", event_id, relay_url);

    let client = Client::new(Keys::generate());
    let url = RelayUrl::parse(relay_url)?;
    client.add_relay(url.clone()).await?;
    client.connect().await;

    // Wait for connection
    sleep(Duration::from_millis(500)).await;

    let filter = Filter::new().id(event_id);

    let mut delay_ms = 100u64;
    for attempt in 0..=max_retries {
        debug!(
            "Attempt {}/{} to verify event on {}",
            attempt + 1,
            max_retries + 1,
            relay_url
        );

        let events = client
            .fetch_events_from(vec![url.clone()], filter.clone(), Duration::from_secs(10))
            .await?;

        if let Some(event) = events.into_iter().next() {
            client.disconnect().await;
            return check_announcement(&event, expected_identifier);
        }

        if attempt < max_retries {
            debug!("Event not found yet, waiting {}ms before retry", delay_ms);
            sleep(Duration::from_millis(delay_ms)).await;
            delay_ms = (delay_ms * 2).min(5000);
        }
    }

    client.disconnect().await;
    anyhow::bail!(
        "Event {} not found on relay {} after {} retries",
        event_id,
        relay_url,
        max_retries
    )
}

fn check_announcement(event: &nostr_sdk::Event, expected_identifier: &str) -> Result<()> {
    if event.kind.as_u16() != KIND_GIT_REPO_ANNOUNCEMENT {
        anyhow::bail!("Unexpected kind {}", event.kind);
    }
    event.verify().context("Relay returned an event with a bad signature")?;

    let identifier = event
        .tags
        .iter()
        .map(|tag| tag.as_slice())
        .find(|row| row.first().map(String::as_str) == Some("d"))
        .and_then(|row| row.get(1).cloned());

    match identifier {
        Some(d) if d == expected_identifier => Ok(()),
        other => anyhow::bail!(
            "Expected d tag '{}', got {:?}",
            expected_identifier,
            other
        ),
    }
}
