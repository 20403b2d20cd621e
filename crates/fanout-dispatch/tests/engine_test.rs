//! End-to-end dispatch scenarios with stubbed senders and virtual time.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use fanout_core::{Category, Channel, DeliveryStatus, Message, Recipient, RecipientId, TestClock};
use fanout_dispatch::{
    ChannelSender, CircuitState, DeliveryError, DispatchConfig, DispatchEngine, InMemoryDirectory,
    InMemoryMessageStore, InMemoryOutcomeStore, Result, SenderRegistry,
};

/// How a stub sender behaves on each invocation.
#[derive(Debug, Clone, Copy)]
enum StubMode {
    AlwaysSucceed,
    AlwaysUnavailable,
    /// Fail with ServiceUnavailable this many times, then succeed.
    UnavailableTimes(u32),
    AlwaysInvalidContact,
}

/// Scriptable sender that counts its invocations.
#[derive(Debug)]
struct StubSender {
    channel: Channel,
    mode: StubMode,
    calls: AtomicU32,
}

impl StubSender {
    fn new(channel: Channel, mode: StubMode) -> Arc<Self> {
        Arc::new(Self { channel, mode, calls: AtomicU32::new(0) })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelSender for StubSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, _message: &Message, _recipient: &Recipient) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            StubMode::AlwaysSucceed => Ok(()),
            StubMode::AlwaysUnavailable => Err(DeliveryError::service_unavailable(self.channel)),
            StubMode::UnavailableTimes(n) => {
                if call < n {
                    Err(DeliveryError::service_unavailable(self.channel))
                } else {
                    Ok(())
                }
            },
            StubMode::AlwaysInvalidContact => {
                Err(DeliveryError::invalid_contact(self.channel, "stubbed rejection"))
            },
        }
    }
}

fn recipient(
    name: &str,
    subscriptions: impl IntoIterator<Item = Category>,
    channels: impl IntoIterator<Item = Channel>,
) -> Recipient {
    Recipient {
        id: RecipientId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone_number: "+1234567890".to_string(),
        subscriptions: subscriptions.into_iter().collect(),
        channels: channels.into_iter().collect(),
    }
}

struct Harness {
    engine: DispatchEngine,
    clock: TestClock,
}

async fn harness(
    recipients: Vec<Recipient>,
    senders: Vec<Arc<dyn ChannelSender>>,
) -> Harness {
    let directory = InMemoryDirectory::new();
    for r in recipients {
        directory.insert(r).await;
    }

    let clock = TestClock::new();
    let engine = DispatchEngine::new(
        Arc::new(directory),
        Arc::new(SenderRegistry::new(senders)),
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(InMemoryOutcomeStore::new()),
        DispatchConfig::default(),
        Arc::new(clock.clone()),
    );

    Harness { engine, clock }
}

#[tokio::test]
async fn two_recipients_all_senders_succeed() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);
    let sms = StubSender::new(Channel::Sms, StubMode::AlwaysSucceed);

    let h = harness(
        vec![
            recipient("First Fan", [Category::Sports], [Channel::Email, Channel::Sms]),
            recipient("Second Fan", [Category::Sports], [Channel::Email]),
        ],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>, Arc::clone(&sms) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Sports, "update").await.unwrap();

    assert_eq!(summary.total_recipients, 2);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 0);

    let outcomes = h.engine.all_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.status == DeliveryStatus::Success));
    assert_eq!(outcomes.iter().filter(|o| o.channel == Channel::Email).count(), 2);
    assert_eq!(outcomes.iter().filter(|o| o.channel == Channel::Sms).count(), 1);

    assert_eq!(email.calls(), 2);
    assert_eq!(sms.calls(), 1);
}

#[tokio::test]
async fn failing_email_sender_counts_both_failures() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysUnavailable);
    let sms = StubSender::new(Channel::Sms, StubMode::AlwaysSucceed);

    let h = harness(
        vec![
            recipient("First Fan", [Category::Sports], [Channel::Email, Channel::Sms]),
            recipient("Second Fan", [Category::Sports], [Channel::Email]),
        ],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>, Arc::clone(&sms) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Sports, "update").await.unwrap();

    assert_eq!(summary.total_recipients, 2);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 2);

    // Each email task retried to the ceiling
    assert_eq!(email.calls(), 6);

    let failures: Vec<_> = h
        .engine
        .all_outcomes()
        .await
        .unwrap()
        .into_iter()
        .filter(|o| o.status == DeliveryStatus::Failed)
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|o| o.channel == Channel::Email));
    assert!(failures
        .iter()
        .all(|o| o.error.as_deref().unwrap_or_default().contains("after 3 attempts")));
}

#[tokio::test]
async fn transient_failures_recovered_within_retry_ceiling() {
    let email = StubSender::new(Channel::Email, StubMode::UnavailableTimes(2));

    let h = harness(
        vec![recipient("Only Fan", [Category::Finance], [Channel::Email])],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Finance, "markets").await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(email.calls(), 3);

    // Two backoff sleeps on virtual time: 1s + 2s
    assert_eq!(h.clock.elapsed(), std::time::Duration::from_secs(3));
}

#[tokio::test]
async fn permanent_failure_not_retried() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysInvalidContact);

    let h = harness(
        vec![recipient("Only Fan", [Category::Finance], [Channel::Email])],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Finance, "markets").await.unwrap();

    assert_eq!(summary.failure_count, 1);
    assert_eq!(email.calls(), 1);
}

#[tokio::test]
async fn unsubscribed_recipients_never_contacted() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);

    let h = harness(
        vec![
            recipient("Sports Fan", [Category::Sports], [Channel::Email]),
            recipient("Movie Buff", [Category::Movies], [Channel::Email]),
        ],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Sports, "kickoff").await.unwrap();

    assert_eq!(summary.total_recipients, 1);
    assert_eq!(email.calls(), 1);

    let outcomes = h.engine.all_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].recipient_name, "Sports Fan");
}

#[tokio::test]
async fn zero_channel_recipient_counted_but_attempt_free() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);

    let h = harness(
        vec![
            recipient("Connected Fan", [Category::Sports], [Channel::Email]),
            recipient("Unreachable Fan", [Category::Sports], HashSet::new()),
        ],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Sports, "kickoff").await.unwrap();

    assert_eq!(summary.total_recipients, 2);
    assert_eq!(summary.success_count + summary.failure_count, 1);
    assert_eq!(h.engine.all_outcomes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn counter_sum_matches_pair_count() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysUnavailable);
    let sms = StubSender::new(Channel::Sms, StubMode::AlwaysSucceed);
    let push = StubSender::new(Channel::Push, StubMode::UnavailableTimes(1));

    let h = harness(
        vec![
            recipient("A", [Category::Movies], [Channel::Email, Channel::Sms, Channel::Push]),
            recipient("B", [Category::Movies], [Channel::Sms]),
            recipient("C", [Category::Movies], [Channel::Email, Channel::Push]),
            recipient("D", [Category::Movies], HashSet::new()),
        ],
        vec![
            Arc::clone(&email) as Arc<dyn ChannelSender>,
            Arc::clone(&sms) as Arc<dyn ChannelSender>,
            Arc::clone(&push) as Arc<dyn ChannelSender>,
        ],
    )
    .await;

    let summary = h.engine.dispatch(Category::Movies, "premiere").await.unwrap();

    // Pairs: A×3 + B×1 + C×2 + D×0 = 6
    assert_eq!(summary.total_recipients, 4);
    assert_eq!(summary.success_count + summary.failure_count, 6);
    assert_eq!(h.engine.all_outcomes().await.unwrap().len(), 6);
}

#[tokio::test]
async fn unsupported_channel_fails_only_that_task() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);

    // No SMS sender registered
    let h = harness(
        vec![recipient("Both Fan", [Category::Sports], [Channel::Email, Channel::Sms])],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    let summary = h.engine.dispatch(Category::Sports, "kickoff").await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);

    let outcomes = h.engine.all_outcomes().await.unwrap();
    let failed = outcomes.iter().find(|o| o.status == DeliveryStatus::Failed).unwrap();
    assert_eq!(failed.channel, Channel::Sms);
    assert!(failed.error.as_deref().unwrap_or_default().contains("no sender registered"));
}

#[tokio::test]
async fn open_circuit_blocks_without_invoking_sender() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);

    let h = harness(
        vec![recipient("Blocked Fan", [Category::Finance], [Channel::Email])],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    h.engine.breakers().force_state(Channel::Email, CircuitState::Open).await;

    let summary = h.engine.dispatch(Category::Finance, "markets").await.unwrap();

    assert_eq!(summary.failure_count, 1);
    assert_eq!(email.calls(), 0, "sender must not be invoked while the circuit is open");

    let outcomes = h.engine.all_outcomes().await.unwrap();
    assert!(outcomes[0].error.as_deref().unwrap_or_default().contains("circuit breaker open"));
}

#[tokio::test]
async fn repeated_outages_open_the_circuit_then_cooldown_recovers_it() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysUnavailable);

    let h = harness(
        vec![recipient("Only Fan", [Category::Finance], [Channel::Email])],
        vec![Arc::clone(&email) as Arc<dyn ChannelSender>],
    )
    .await;

    // Each dispatch records one breaker failure (after retries resolve);
    // the fifth opens the circuit.
    for _ in 0..5 {
        h.engine.dispatch(Category::Finance, "markets").await.unwrap();
    }
    assert_eq!(h.engine.breakers().state(Channel::Email).await, CircuitState::Open);

    // Fail fast while open: no further sender invocations
    let calls_when_opened = email.calls();
    let summary = h.engine.dispatch(Category::Finance, "markets").await.unwrap();
    assert_eq!(summary.failure_count, 1);
    assert_eq!(email.calls(), calls_when_opened);

    // After the cooldown the circuit probes again
    h.clock.advance(std::time::Duration::from_secs(61));
    h.engine.dispatch(Category::Finance, "markets").await.unwrap();
    assert!(email.calls() > calls_when_opened);
}

#[tokio::test]
async fn outcome_queries_filter_and_order() {
    let email = StubSender::new(Channel::Email, StubMode::AlwaysSucceed);

    let fan = recipient("Query Fan", [Category::Sports], [Channel::Email]);
    let fan_id = fan.id;

    let h = harness(vec![fan], vec![Arc::clone(&email) as Arc<dyn ChannelSender>]).await;

    let first = h.engine.dispatch(Category::Sports, "first").await.unwrap();
    h.clock.advance(std::time::Duration::from_secs(10));
    let second = h.engine.dispatch(Category::Sports, "second").await.unwrap();

    let by_recipient = h.engine.outcomes_for_recipient(fan_id).await.unwrap();
    assert_eq!(by_recipient.len(), 2);
    assert_eq!(by_recipient[0].content, "second", "most recent first");
    assert_eq!(by_recipient[1].content, "first");

    assert_eq!(h.engine.outcomes_for_message(first.message_id).await.unwrap().len(), 1);
    assert_eq!(h.engine.outcomes_for_message(second.message_id).await.unwrap().len(), 1);
}
