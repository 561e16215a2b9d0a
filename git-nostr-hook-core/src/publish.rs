//! Best-effort fan-out of a signed event to every configured relay.
//!
//! Each relay gets its own connection and its own outcome slot. All attempts
//! are polled together and the report is produced only once every one of them
//! has settled.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::future::join_all;
use nostr::{Event, RelayUrl};
use nostr_sdk::Client;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::types::*;

/// Relay wire transport, one connection per attempt
#[async_trait]
pub trait Transport: Send + Sync {
    type Connection: Send;

    async fn connect(&self, relay: &str) -> Result<Self::Connection>;

    /// Send the event and wait for the relay to acknowledge it
    async fn send(&self, connection: &Self::Connection, event: &Event) -> Result<()>;

    async fn close(&self, connection: Self::Connection) -> Result<()>;
}

/// Transport backed by a single-relay `nostr-sdk` client per connection
#[derive(Debug, Clone)]
pub struct NostrTransport {
    connect_timeout: Duration,
}

impl NostrTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for NostrTransport {
    fn default() -> Self {
        Self::new(PublishConfig::default().timeout)
    }
}

pub struct RelayConnection {
    client: Client,
    url: RelayUrl,
}

#[async_trait]
impl Transport for NostrTransport {
    type Connection = RelayConnection;

    async fn connect(&self, relay: &str) -> Result<RelayConnection> {
        let url = RelayUrl::parse(relay).with_context(|| format!("Invalid relay URL {relay}"))?;

        let client = Client::default();
        client.add_relay(url.clone()).await?;

        if let Err(e) = client
            .try_connect_relay(url.clone(), self.connect_timeout)
            .await
        {
            client.disconnect().await;
            return Err(e.into());
        }

        Ok(RelayConnection { client, url })
    }

    async fn send(&self, connection: &RelayConnection, event: &Event) -> Result<()> {
        let output = connection
            .client
            .send_event_to([connection.url.clone()], event)
            .await?;

        if let Some(message) = output.failed.get(&connection.url) {
            bail!("rejected: {message}");
        }
        if !output.success.contains(&connection.url) {
            bail!("no acknowledgement from relay");
        }

        Ok(())
    }

    async fn close(&self, connection: RelayConnection) -> Result<()> {
        connection.client.disconnect().await;
        Ok(())
    }
}

/// Publish an event to every relay and report per-relay outcomes.
///
/// Never fails: relay errors are captured in the report in configured order.
pub async fn publish<T: Transport>(
    event: &Event,
    relays: &[String],
    transport: &T,
    config: &PublishConfig,
) -> PublishReport {
    debug!("Publishing event {} to {} relay(s)", event.id, relays.len());

    let attempts = relays
        .iter()
        .map(|relay| publish_to_relay(event, relay, transport, config));
    let results = join_all(attempts).await;

    let report = PublishReport::from_results(results);
    info!(
        "Event {} accepted by {}/{} relays",
        event.id, report.succeeded, report.total
    );
    report
}

async fn publish_to_relay<T: Transport>(
    event: &Event,
    relay: &str,
    transport: &T,
    config: &PublishConfig,
) -> RelayResult {
    let outcome = deliver(event, relay, transport, config).await;

    match &outcome {
        RelayOutcome::Delivered => info!("Published to {relay}"),
        RelayOutcome::Failed { stage, reason } => {
            warn!("Failed to publish to {relay} during {stage}: {reason}")
        }
    }

    RelayResult {
        relay: relay.to_string(),
        outcome,
    }
}

/// Upper bound on releasing a connection once the outcome is known
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connect and send share one deadline, so an attempt settles within
/// `config.timeout` plus at most [`CLOSE_TIMEOUT`].
async fn deliver<T: Transport>(
    event: &Event,
    relay: &str,
    transport: &T,
    config: &PublishConfig,
) -> RelayOutcome {
    let deadline = Instant::now() + config.timeout;

    let connection = match timeout_at(deadline, transport.connect(relay)).await {
        Ok(Ok(connection)) => connection,
        Ok(Err(e)) => return failed(DeliveryStage::Connect, format!("{e:#}")),
        Err(_) => return failed(DeliveryStage::Connect, timed_out(config.timeout)),
    };

    let sent = timeout_at(deadline, transport.send(&connection, event)).await;

    // The connection is released whatever the send did
    let close_limit = CLOSE_TIMEOUT.min(config.timeout);
    match timeout(close_limit, transport.close(connection)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to close connection to {relay}: {e:#}"),
        Err(_) => warn!("Timed out closing connection to {relay}"),
    }

    match sent {
        Ok(Ok(())) => RelayOutcome::Delivered,
        Ok(Err(e)) => failed(DeliveryStage::Send, format!("{e:#}")),
        Err(_) => failed(DeliveryStage::Send, timed_out(config.timeout)),
    }
}

fn failed(stage: DeliveryStage, reason: String) -> RelayOutcome {
    RelayOutcome::Failed { stage, reason }
}

fn timed_out(limit: Duration) -> String {
    format!("timed out after {secs:.1}s", secs = limit.as_secs_f64())
}


#[cfg(test)]
mod tests {
    use super::test_transport::{Script, ScriptedTransport};
    use super::*;
    use crate::events::{FixedClock, build_announcement};
    use crate::signer::{parse_secret_key, sign};

    const TEST_KEY: &str = "6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e";

    fn signed_event() -> Event {
        let facts = RepositoryFacts {
            name: "demo".to_string(),
            remote_url: None,
            current_branch: "main".to_string(),
            commit_subject: Some("Test".to_string()),
            branch_refs: vec![],
        };
        let keys = parse_secret_key(TEST_KEY).unwrap();
        sign(build_announcement(&facts, &FixedClock(1_700_000_000)), &keys).unwrap()
    }

    fn relays(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_of_three_with_timeout() {
        let transport = ScriptedTransport::new([
            ("wss://a", Script::Deliver { delay: Duration::from_millis(100) }),
            ("wss://b", Script::HangOnSend),
            ("wss://c", Script::Deliver { delay: Duration::from_millis(300) }),
        ]);
        let relay_list = relays(&["wss://a", "wss://b", "wss://c"]);

        let report = publish(
            &signed_event(),
            &relay_list,
            &transport,
            &PublishConfig::default(),
        )
        .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.total, 3);
        let order: Vec<&str> = report.relays.iter().map(|r| r.relay.as_str()).collect();
        assert_eq!(order, vec!["wss://a", "wss://b", "wss://c"]);
        assert!(report.relays[0].outcome.is_delivered());
        assert!(matches!(
            &report.relays[1].outcome,
            RelayOutcome::Failed { stage: DeliveryStage::Send, reason } if reason.contains("timed out")
        ));
        assert!(report.relays[2].outcome.is_delivered());
        let delivered = transport.delivered.lock().unwrap();
        let mut delivered_to: Vec<&str> = delivered.iter().map(|(r, _)| r.as_str()).collect();
        delivered_to.sort();
        assert_eq!(delivered_to, vec!["wss://a", "wss://c"]);
        // Every opened connection is closed, including the timed out one
        assert_eq!(transport.close_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_bounded_by_slowest_attempt() {
        let transport = ScriptedTransport::new([
            ("wss://one", Script::Deliver { delay: Duration::from_secs(1) }),
            ("wss://two", Script::Deliver { delay: Duration::from_secs(2) }),
            ("wss://three", Script::Deliver { delay: Duration::from_secs(3) }),
            ("wss://four", Script::Deliver { delay: Duration::from_secs(3) }),
        ]);
        let relay_list = relays(&["wss://one", "wss://two", "wss://three", "wss://four"]);

        let started = tokio::time::Instant::now();
        let report = publish(
            &signed_event(),
            &relay_list,
            &transport,
            &PublishConfig::default(),
        )
        .await;
        let elapsed = started.elapsed();

        assert_eq!(report.succeeded, 4);
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_connect_is_bounded_by_timeout() {
        let transport = ScriptedTransport::new([
            ("wss://slow", Script::HangOnConnect),
            ("wss://fast", Script::Deliver { delay: Duration::ZERO }),
        ]);
        let config = PublishConfig {
            timeout: Duration::from_secs(2),
        };

        let started = tokio::time::Instant::now();
        let report = publish(
            &signed_event(),
            &relays(&["wss://slow", "wss://fast"]),
            &transport,
            &config,
        )
        .await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(report.succeeded, 1);
        assert_eq!(
            report.relays[0].outcome,
            RelayOutcome::Failed {
                stage: DeliveryStage::Connect,
                reason: "timed out after 2.0s".to_string(),
            }
        );
        // Never connected, so nothing to close
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_settles_within_one_timeout() {
        let transport = ScriptedTransport::new([(
            "wss://sluggish",
            Script::SlowSteps(Duration::from_millis(4900)),
        )]);
        let config = PublishConfig::default();

        let started = tokio::time::Instant::now();
        let report = publish(
            &signed_event(),
            &relays(&["wss://sluggish"]),
            &transport,
            &config,
        )
        .await;
        let elapsed = started.elapsed();

        // Connect used 4.9s of the budget, so send runs out at the 5s deadline
        assert_eq!(
            report.relays[0].outcome,
            RelayOutcome::Failed {
                stage: DeliveryStage::Send,
                reason: "timed out after 5.0s".to_string(),
            }
        );
        assert!(elapsed <= config.timeout + CLOSE_TIMEOUT, "took {elapsed:?}");
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_close_keeps_delivery() {
        let transport = ScriptedTransport::new([(
            "wss://lingering",
            Script::SlowSteps(Duration::from_millis(1500)),
        )]);

        let started = tokio::time::Instant::now();
        let report = publish(
            &signed_event(),
            &relays(&["wss://lingering"]),
            &transport,
            &PublishConfig::default(),
        )
        .await;

        // 1.5s connect + 1.5s send, then close is cut off after 1s
        assert!(report.relays[0].outcome.is_delivered());
        assert!(started.elapsed() <= Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_failures_are_classified_by_stage() {
        let transport = ScriptedTransport::new([
            ("wss://refuse", Script::RefuseConnect),
            ("wss://reject", Script::RejectSend("blocked: not allowed".to_string())),
            ("wss://flaky-close", Script::FailClose),
        ]);

        let report = publish(
            &signed_event(),
            &relays(&["wss://refuse", "wss://reject", "wss://flaky-close"]),
            &transport,
            &PublishConfig::default(),
        )
        .await;

        assert_eq!(
            report.relays[0].outcome,
            RelayOutcome::Failed {
                stage: DeliveryStage::Connect,
                reason: "connection refused".to_string(),
            }
        );
        assert_eq!(
            report.relays[1].outcome,
            RelayOutcome::Failed {
                stage: DeliveryStage::Send,
                reason: "rejected: blocked: not allowed".to_string(),
            }
        );
        // A failed close does not undo a delivery
        assert!(report.relays[2].outcome.is_delivered());
        assert_eq!(report.succeeded, 1);
    }

    #[tokio::test]
    async fn test_all_failed_is_still_a_report() {
        let transport = ScriptedTransport::default();
        let report = publish(
            &signed_event(),
            &relays(&["wss://x", "wss://y"]),
            &transport,
            &PublishConfig::default(),
        )
        .await;

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.total, 2);
        assert!(report.all_failed());
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_every_outcome_combination() {
        let behaviours = [
            Script::Deliver { delay: Duration::ZERO },
            Script::RefuseConnect,
            Script::RejectSend("invalid".to_string()),
        ];
        let names = ["wss://r0", "wss://r1", "wss://r2"];

        for mask in 0..27usize {
            let mut scripts = Vec::new();
            let mut expected = 0;
            for (i, name) in names.iter().enumerate() {
                let choice = (mask / 3usize.pow(i as u32)) % 3;
                if choice == 0 {
                    expected += 1;
                }
                scripts.push((*name, behaviours[choice].clone()));
            }
            let transport = ScriptedTransport::new(scripts);

            let report = publish(
                &signed_event(),
                &relays(&names),
                &transport,
                &PublishConfig::default(),
            )
            .await;

            assert_eq!(report.total, 3);
            assert_eq!(report.relays.len(), 3);
            assert_eq!(report.succeeded, expected, "mask {mask}");
        }
    }

    #[tokio::test]
    async fn test_no_relays() {
        let transport = ScriptedTransport::default();
        let report = publish(&signed_event(), &[], &transport, &PublishConfig::default()).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(transport.connect_count(), 0);
    }

    #[test]
    fn test_timed_out_message() {
        assert_eq!(timed_out(Duration::from_millis(1500)), "timed out after 1.5s");
    }
}
