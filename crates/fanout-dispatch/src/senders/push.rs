//! Simulated push notification delivery (FCM/APNS-style service).

use async_trait::async_trait;
use fanout_core::{Channel, Message, Recipient};
use serde_json::json;

use super::{provider_outage, ChannelSender};
use crate::error::{DeliveryError, Result};

/// Default probability of a simulated service outage per send.
const DEFAULT_FAILURE_RATE: f64 = 0.15;

/// Maximum notification body size in bytes.
const MAX_BODY_BYTES: usize = 4000;

const DEVICE_TOKEN_PREFIX: &str = "device_";

/// Push sender backed by a simulated notification service.
///
/// The device token is derived from the recipient id, so unlike email
/// and SMS there is no missing-contact case.
#[derive(Debug, Clone)]
pub struct PushSender {
    failure_rate: f64,
}

impl PushSender {
    /// Creates a push sender with the default outage rate.
    pub fn new() -> Self {
        Self { failure_rate: DEFAULT_FAILURE_RATE }
    }

    /// Creates a push sender with a custom outage rate.
    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self { failure_rate }
    }
}

impl Default for PushSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn send(&self, message: &Message, recipient: &Recipient) -> Result<()> {
        let device_token = format!("{DEVICE_TOKEN_PREFIX}{}", recipient.id);

        tracing::info!(
            recipient = %recipient.name,
            device_token,
            category = %message.category,
            "sending push notification"
        );

        if provider_outage(self.failure_rate) {
            return Err(DeliveryError::service_unavailable(Channel::Push));
        }

        let payload = json!({
            "to": device_token,
            "notification": {
                "title": message.category.display_name(),
                "body": message.content,
            }
        });
        tracing::debug!(%payload, "push notification payload composed");

        // Size check follows composition: the service rejects the body,
        // not the request envelope.
        if message.content.len() > MAX_BODY_BYTES {
            return Err(DeliveryError::payload_too_large(message.content.len(), MAX_BODY_BYTES));
        }

        Ok(())
    }
}
