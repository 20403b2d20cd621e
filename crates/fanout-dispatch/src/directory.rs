//! Recipient directory: who subscribes to what, over which channels.
//!
//! The dispatcher only needs category lookups; the trait keeps the
//! backing store swappable. The in-memory implementation doubles as the
//! demo fixture source.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use fanout_core::{Category, Channel, Recipient, RecipientId};
use tokio::sync::RwLock;

use crate::error::Result;

/// Lookup interface for registered recipients.
#[async_trait]
pub trait RecipientDirectory: Send + Sync + std::fmt::Debug {
    /// Finds a recipient by id.
    async fn find_by_id(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Returns all registered recipients.
    async fn find_all(&self) -> Result<Vec<Recipient>>;

    /// Returns all recipients subscribed to the given category.
    async fn find_by_category(&self, category: Category) -> Result<Vec<Recipient>>;
}

/// In-memory recipient directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    recipients: RwLock<HashMap<RecipientId, Recipient>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory seeded with the ten demo recipients.
    ///
    /// The fixtures cover the interesting edges: a recipient with no
    /// phone number, one with no email address, and one with no
    /// subscriptions at all.
    pub fn with_sample_recipients() -> Self {
        let recipients = sample_recipients();
        tracing::info!(count = recipients.len(), "initialized sample recipients");

        Self {
            recipients: RwLock::new(recipients.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    /// Adds or replaces a recipient.
    pub async fn insert(&self, recipient: Recipient) {
        self.recipients.write().await.insert(recipient.id, recipient);
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn find_by_id(&self, id: RecipientId) -> Result<Option<Recipient>> {
        Ok(self.recipients.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Recipient>> {
        Ok(self.recipients.read().await.values().cloned().collect())
    }

    async fn find_by_category(&self, category: Category) -> Result<Vec<Recipient>> {
        Ok(self
            .recipients
            .read()
            .await
            .values()
            .filter(|recipient| recipient.is_subscribed_to(category))
            .cloned()
            .collect())
    }
}

fn recipient(
    name: &str,
    email: &str,
    phone: &str,
    subscriptions: impl IntoIterator<Item = Category>,
    channels: impl IntoIterator<Item = Channel>,
) -> Recipient {
    Recipient {
        id: RecipientId::new(),
        name: name.to_string(),
        email: email.to_string(),
        phone_number: phone.to_string(),
        subscriptions: subscriptions.into_iter().collect(),
        channels: channels.into_iter().collect(),
    }
}

/// The ten demo recipients.
fn sample_recipients() -> Vec<Recipient> {
    use Category::{Finance, Movies, Sports};
    use Channel::{Email, Push, Sms};

    vec![
        recipient(
            "John Doe",
            "john.doe@example.com",
            "+1234567890",
            [Sports, Finance],
            [Sms, Email],
        ),
        recipient("Jane Smith", "jane.smith@example.com", "+1234567891", [Movies], [Email]),
        recipient(
            "Bob Johnson",
            "bob.johnson@example.com",
            "+1234567892",
            [Sports, Movies],
            [Sms, Push],
        ),
        recipient("Alice Brown", "alice.brown@example.com", "+1234567893", [Finance], [Push]),
        recipient(
            "Charlie Wilson",
            "charlie.wilson@example.com",
            "+1234567894",
            [Sports, Finance, Movies],
            [Sms, Email, Push],
        ),
        recipient(
            "Diana Martinez",
            "diana.martinez@example.com",
            "+1234567895",
            [Movies, Finance],
            [Email, Push],
        ),
        recipient("Edward Davis", "edward.davis@example.com", "+1234567896", [Sports], [Sms]),
        // No phone number on file
        recipient("Fiona Garcia", "fiona.garcia@example.com", "", [Finance, Movies], [Email]),
        // No email address on file
        recipient("George Lee", "", "+1234567897", [Sports], [Sms, Push]),
        // No subscriptions
        recipient(
            "Helen White",
            "helen.white@example.com",
            "+1234567898",
            HashSet::new(),
            [Email],
        ),
    ]
}
