//! Dispatch engine coordinating the fan-out delivery lifecycle.
//!
//! One `dispatch` call validates the message, persists it, resolves the
//! subscribed recipients, and spawns one delivery task per
//! (recipient, channel) pair. Each task runs the full pipeline: sender
//! resolution, circuit check, retried send, breaker signal, outcome
//! record. Task failures become failure records and counter increments;
//! they never escape the task boundary, so the dispatch call itself only
//! fails on empty content or a message-persist error.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use fanout_core::{
    Category, Channel, Clock, DeliveryOutcome, Message, MessageId, Recipient, RecipientId,
};
use tokio::task::JoinSet;

use crate::{
    circuit::{CircuitBreakerManager, CircuitConfig},
    directory::RecipientDirectory,
    error::{DeliveryError, Result},
    retry::RetryPolicy,
    store::{MessageStore, OutcomeStore},
    strategy::SenderRegistry,
};

/// Configuration for the dispatch engine.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Retry policy applied to every sender invocation.
    pub retry_policy: RetryPolicy,
    /// Circuit breaker configuration shared by all channels.
    pub circuit: CircuitConfig,
}

/// Aggregate result of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Identity assigned to the dispatched message.
    pub message_id: MessageId,
    /// Recipients subscribed to the category, including those with no
    /// enabled channels.
    pub total_recipients: usize,
    /// Delivery tasks that succeeded.
    pub success_count: u64,
    /// Delivery tasks that failed.
    pub failure_count: u64,
}

/// Fan-out dispatch engine.
///
/// Cheap to clone; all collaborators are shared behind `Arc`, and the
/// circuit breaker state is shared across every clone and dispatch.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    directory: Arc<dyn RecipientDirectory>,
    registry: Arc<SenderRegistry>,
    messages: Arc<dyn MessageStore>,
    outcomes: Arc<dyn OutcomeStore>,
    breakers: Arc<CircuitBreakerManager>,
    retry_policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl DispatchEngine {
    /// Creates a new dispatch engine.
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        registry: Arc<SenderRegistry>,
        messages: Arc<dyn MessageStore>,
        outcomes: Arc<dyn OutcomeStore>,
        config: DispatchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let breakers =
            Arc::new(CircuitBreakerManager::new(config.circuit, Arc::clone(&clock)));

        Self {
            directory,
            registry,
            messages,
            outcomes,
            breakers,
            retry_policy: config.retry_policy,
            clock,
        }
    }

    /// Access to the per-channel circuit breakers.
    pub fn breakers(&self) -> &CircuitBreakerManager {
        &self.breakers
    }

    /// Fans `content` out to every recipient subscribed to `category`.
    ///
    /// Returns once every delivery task has completed and recorded its
    /// outcome. Only empty content and message-persist failures surface
    /// here; per-recipient failures are reflected in the counters.
    pub async fn dispatch(&self, category: Category, content: &str) -> Result<DispatchSummary> {
        if content.trim().is_empty() {
            return Err(DeliveryError::EmptyContent);
        }

        let message = self
            .messages
            .persist(category, content.to_string(), self.timestamp())
            .await?;

        let recipients = self.directory.find_by_category(category).await?;
        let total_recipients = recipients.len();

        tracing::info!(
            message_id = %message.id,
            %category,
            recipients = total_recipients,
            "dispatching message"
        );

        let success_count = Arc::new(AtomicU64::new(0));
        let failure_count = Arc::new(AtomicU64::new(0));
        let mut tasks = JoinSet::new();

        for recipient in recipients {
            for channel in recipient.channels.iter().copied() {
                let engine = self.clone();
                let message = message.clone();
                let recipient = recipient.clone();
                let success_count = Arc::clone(&success_count);
                let failure_count = Arc::clone(&failure_count);

                tasks.spawn(async move {
                    engine
                        .run_delivery_task(
                            &message,
                            &recipient,
                            channel,
                            &success_count,
                            &failure_count,
                        )
                        .await;
                });
            }
        }

        // Barrier: the summary covers every spawned task
        while let Some(joined) = tasks.join_next().await {
            if let Err(panic) = joined {
                tracing::error!(error = %panic, "delivery task panicked");
                failure_count.fetch_add(1, Ordering::SeqCst);
            }
        }

        let summary = DispatchSummary {
            message_id: message.id,
            total_recipients,
            success_count: success_count.load(Ordering::SeqCst),
            failure_count: failure_count.load(Ordering::SeqCst),
        };

        tracing::info!(
            message_id = %summary.message_id,
            total_recipients = summary.total_recipients,
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "dispatch complete"
        );

        Ok(summary)
    }

    /// Runs one delivery task to completion.
    ///
    /// Every exit path records exactly one outcome and increments
    /// exactly one counter. Outcome-store failures are logged, never
    /// propagated.
    async fn run_delivery_task(
        &self,
        message: &Message,
        recipient: &Recipient,
        channel: Channel,
        success_count: &AtomicU64,
        failure_count: &AtomicU64,
    ) {
        let result = self.attempt_delivery(message, recipient, channel).await;
        let sent_at = self.timestamp();

        let outcome = match &result {
            Ok(()) => DeliveryOutcome::success(message, recipient, channel, sent_at),
            Err(error) => {
                tracing::warn!(
                    message_id = %message.id,
                    recipient = %recipient.name,
                    %channel,
                    %error,
                    "delivery failed"
                );
                DeliveryOutcome::failure(message, recipient, channel, error.to_string(), sent_at)
            },
        };

        if let Err(error) = self.outcomes.record(outcome).await {
            tracing::warn!(
                message_id = %message.id,
                %channel,
                %error,
                "failed to record delivery outcome"
            );
        }

        let counter = if result.is_ok() { success_count } else { failure_count };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// The delivery pipeline for one (recipient, channel) pair.
    ///
    /// Sender resolution and the circuit check precede any provider
    /// call; a blocked request fails fast without signalling the
    /// breaker. The breaker observes one signal per task, after the
    /// retry policy has resolved.
    async fn attempt_delivery(
        &self,
        message: &Message,
        recipient: &Recipient,
        channel: Channel,
    ) -> Result<()> {
        let sender = self.registry.resolve(channel)?;

        if !self.breakers.allow_request(channel).await {
            tracing::warn!(
                message_id = %message.id,
                recipient = %recipient.name,
                %channel,
                "circuit open, delivery blocked"
            );
            return Err(DeliveryError::circuit_open(channel));
        }

        let result = self
            .retry_policy
            .run(self.clock.as_ref(), || sender.send(message, recipient))
            .await;

        match &result {
            Ok(()) => self.breakers.record_success(channel).await,
            Err(_) => self.breakers.record_failure(channel).await,
        }

        result
    }

    /// Outcomes targeting a recipient, most recent first.
    pub async fn outcomes_for_recipient(&self, id: RecipientId) -> Result<Vec<DeliveryOutcome>> {
        self.outcomes.outcomes_for_recipient(id).await
    }

    /// Outcomes for a message, most recent first.
    pub async fn outcomes_for_message(&self, id: MessageId) -> Result<Vec<DeliveryOutcome>> {
        self.outcomes.outcomes_for_message(id).await
    }

    /// All recorded outcomes, most recent first.
    pub async fn all_outcomes(&self) -> Result<Vec<DeliveryOutcome>> {
        self.outcomes.all_outcomes().await
    }

    fn timestamp(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.now_system())
    }
}
