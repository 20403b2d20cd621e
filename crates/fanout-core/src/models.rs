//! Domain models and strongly-typed identifiers.
//!
//! Defines message categories, delivery channels, recipients, and the
//! immutable outcome records produced by the dispatch pipeline. Newtype
//! ID wrappers give compile-time separation between the different UUID
//! spaces.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic a message belongs to and recipients subscribe to.
///
/// The category set is closed: adding a category is a code change, not
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Sports news and score updates.
    Sports,
    /// Financial and market updates.
    Finance,
    /// Movie releases and reviews.
    Movies,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 3] = [Category::Sports, Category::Finance, Category::Movies];

    /// Human-readable name for user-facing output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sports => "Sports",
            Self::Finance => "Finance",
            Self::Movies => "Movies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sports => write!(f, "sports"),
            Self::Finance => write!(f, "finance"),
            Self::Movies => write!(f, "movies"),
        }
    }
}

/// Delivery channel a recipient can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Text message to the recipient's phone number.
    Sms,
    /// Email to the recipient's address.
    Email,
    /// Push notification to the recipient's device.
    Push,
}

impl Channel {
    /// All channels, in declaration order.
    pub const ALL: [Channel; 3] = [Channel::Sms, Channel::Email, Channel::Push];

    /// Human-readable name for user-facing output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Email => "E-Mail",
            Self::Push => "Push Notification",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sms => write!(f, "sms"),
            Self::Email => write!(f, "email"),
            Self::Push => write!(f, "push"),
        }
    }
}

/// Strongly-typed message identifier.
///
/// Wraps a UUID to prevent mixing with other ID types. Assigned when the
/// message is persisted, before fan-out begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Creates a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Strongly-typed recipient identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub Uuid);

impl RecipientId {
    /// Creates a new random recipient ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecipientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RecipientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A message submitted for fan-out delivery.
///
/// Immutable once persisted. Identity and timestamp are assigned by the
/// message store before any delivery task is spawned, so every outcome
/// record can reference them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: MessageId,

    /// Category determining which recipients receive it.
    pub category: Category,

    /// Message body.
    pub content: String,

    /// When the message was accepted for dispatch.
    pub created_at: DateTime<Utc>,
}

/// A registered recipient with subscriptions and enabled channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Unique identifier for this recipient.
    pub id: RecipientId,

    /// Display name, denormalized into outcome records.
    pub name: String,

    /// Email address. Empty means no address on file.
    pub email: String,

    /// Phone number. Empty means no number on file.
    pub phone_number: String,

    /// Categories this recipient is subscribed to.
    pub subscriptions: HashSet<Category>,

    /// Channels this recipient has enabled.
    pub channels: HashSet<Channel>,
}

impl Recipient {
    /// Returns true if the recipient subscribes to the given category.
    pub fn is_subscribed_to(&self, category: Category) -> bool {
        self.subscriptions.contains(&category)
    }

    /// Returns true if the recipient has enabled the given channel.
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    /// Email address, treating the empty string as absent.
    pub fn email_address(&self) -> Option<&str> {
        if self.email.is_empty() {
            None
        } else {
            Some(self.email.as_str())
        }
    }

    /// Phone number, treating the empty string as absent.
    pub fn phone(&self) -> Option<&str> {
        if self.phone_number.is_empty() {
            None
        } else {
            Some(self.phone_number.as_str())
        }
    }
}

/// Final status of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Delivery task has not completed yet.
    Pending,
    /// The channel sender accepted the message.
    Success,
    /// The delivery failed permanently (after retries, if applicable).
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Immutable record of one delivery attempt to one recipient over one
/// channel.
///
/// Recipient name and message content are denormalized so the record is
/// self-contained for audit queries regardless of later changes to the
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// Message that was delivered.
    pub message_id: MessageId,

    /// Category of the message at send time.
    pub category: Category,

    /// Message body at send time.
    pub content: String,

    /// Recipient the delivery targeted.
    pub recipient_id: RecipientId,

    /// Recipient name at send time.
    pub recipient_name: String,

    /// Channel the delivery used.
    pub channel: Channel,

    /// Final status of the attempt.
    pub status: DeliveryStatus,

    /// Error description for failed deliveries.
    pub error: Option<String>,

    /// When the attempt completed.
    pub sent_at: DateTime<Utc>,
}

impl DeliveryOutcome {
    /// Creates a success record for a completed delivery.
    pub fn success(
        message: &Message,
        recipient: &Recipient,
        channel: Channel,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id: message.id,
            category: message.category,
            content: message.content.clone(),
            recipient_id: recipient.id,
            recipient_name: recipient.name.clone(),
            channel,
            status: DeliveryStatus::Success,
            error: None,
            sent_at,
        }
    }

    /// Creates a failure record carrying the error description.
    pub fn failure(
        message: &Message,
        recipient: &Recipient,
        channel: Channel,
        error: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id: message.id,
            category: message.category,
            content: message.content.clone(),
            recipient_id: recipient.id,
            recipient_name: recipient.name.clone(),
            channel,
            status: DeliveryStatus::Failed,
            error: Some(error.into()),
            sent_at,
        }
    }
}
