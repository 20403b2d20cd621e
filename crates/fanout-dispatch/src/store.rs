//! Message and outcome sinks.
//!
//! Trait seams standing in for relational persistence: the message
//! store assigns identity before fan-out, the outcome store keeps one
//! append-only record per delivery attempt. The in-memory
//! implementations back the demo binary and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fanout_core::{Category, DeliveryOutcome, Message, MessageId, RecipientId};
use tokio::sync::RwLock;

use crate::error::Result;

/// Sink assigning identity to accepted messages.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Persists a new message, assigning a fresh id.
    ///
    /// Runs before any delivery task is spawned so every outcome record
    /// can reference the id.
    async fn persist(
        &self,
        category: Category,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Result<Message>;

    /// Finds a persisted message by id.
    async fn find(&self, id: MessageId) -> Result<Option<Message>>;
}

/// Append-only sink for delivery attempt records.
#[async_trait]
pub trait OutcomeStore: Send + Sync + std::fmt::Debug {
    /// Records one completed delivery attempt.
    async fn record(&self, outcome: DeliveryOutcome) -> Result<()>;

    /// Outcomes targeting a recipient, most recent first.
    async fn outcomes_for_recipient(&self, id: RecipientId) -> Result<Vec<DeliveryOutcome>>;

    /// Outcomes for a message, most recent first.
    async fn outcomes_for_message(&self, id: MessageId) -> Result<Vec<DeliveryOutcome>>;

    /// All recorded outcomes, most recent first.
    async fn all_outcomes(&self) -> Result<Vec<DeliveryOutcome>>;
}

/// In-memory message store.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<HashMap<MessageId, Message>>,
}

impl InMemoryMessageStore {
    /// Creates an empty message store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Returns true if no message has been persisted.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn persist(
        &self,
        category: Category,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Result<Message> {
        let message = Message { id: MessageId::new(), category, content, created_at };
        self.messages.write().await.insert(message.id, message.clone());
        Ok(message)
    }

    async fn find(&self, id: MessageId) -> Result<Option<Message>> {
        Ok(self.messages.read().await.get(&id).cloned())
    }
}

/// In-memory outcome store.
#[derive(Debug, Default)]
pub struct InMemoryOutcomeStore {
    outcomes: RwLock<Vec<DeliveryOutcome>>,
}

impl InMemoryOutcomeStore {
    /// Creates an empty outcome store.
    pub fn new() -> Self {
        Self::default()
    }

    fn most_recent_first(mut outcomes: Vec<DeliveryOutcome>) -> Vec<DeliveryOutcome> {
        outcomes.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        outcomes
    }
}

#[async_trait]
impl OutcomeStore for InMemoryOutcomeStore {
    async fn record(&self, outcome: DeliveryOutcome) -> Result<()> {
        self.outcomes.write().await.push(outcome);
        Ok(())
    }

    async fn outcomes_for_recipient(&self, id: RecipientId) -> Result<Vec<DeliveryOutcome>> {
        let outcomes =
            self.outcomes.read().await.iter().filter(|o| o.recipient_id == id).cloned().collect();
        Ok(Self::most_recent_first(outcomes))
    }

    async fn outcomes_for_message(&self, id: MessageId) -> Result<Vec<DeliveryOutcome>> {
        let outcomes =
            self.outcomes.read().await.iter().filter(|o| o.message_id == id).cloned().collect();
        Ok(Self::most_recent_first(outcomes))
    }

    async fn all_outcomes(&self) -> Result<Vec<DeliveryOutcome>> {
        Ok(Self::most_recent_first(self.outcomes.read().await.clone()))
    }
}
