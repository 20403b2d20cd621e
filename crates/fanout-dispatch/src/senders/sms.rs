//! Simulated SMS delivery through a gateway service.

use async_trait::async_trait;
use fanout_core::{Channel, Message, Recipient};

use super::{provider_outage, ChannelSender};
use crate::error::{DeliveryError, Result};

/// Default probability of a simulated gateway outage per send.
const DEFAULT_FAILURE_RATE: f64 = 0.1;

/// Single-part SMS character limit. Longer content is still delivered,
/// split into multiple parts by the gateway.
const SMS_CHARACTER_LIMIT: usize = 160;

/// SMS sender backed by a simulated gateway.
#[derive(Debug, Clone)]
pub struct SmsSender {
    failure_rate: f64,
}

impl SmsSender {
    /// Creates an SMS sender with the default outage rate.
    pub fn new() -> Self {
        Self { failure_rate: DEFAULT_FAILURE_RATE }
    }

    /// Creates an SMS sender with a custom outage rate.
    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self { failure_rate }
    }
}

impl Default for SmsSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, message: &Message, recipient: &Recipient) -> Result<()> {
        let Some(number) = recipient.phone() else {
            return Err(DeliveryError::missing_contact(Channel::Sms));
        };

        tracing::info!(
            recipient = %recipient.name,
            number,
            category = %message.category,
            "sending SMS"
        );

        if provider_outage(self.failure_rate) {
            return Err(DeliveryError::service_unavailable(Channel::Sms));
        }

        if !is_valid_phone(number) {
            return Err(DeliveryError::invalid_contact(
                Channel::Sms,
                format!("malformed phone number: {number}"),
            ));
        }

        if message.content.chars().count() > SMS_CHARACTER_LIMIT {
            tracing::warn!(
                length = message.content.chars().count(),
                limit = SMS_CHARACTER_LIMIT,
                "message exceeds SMS character limit, will be sent as multiple parts"
            );
        }

        Ok(())
    }
}

/// E.164-shape check: optional `+`, a leading non-zero digit, then one
/// to fourteen more digits.
fn is_valid_phone(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);

    (2..=15).contains(&digits.len())
        && digits.starts_with(|c: char| ('1'..='9').contains(&c))
        && digits.chars().all(|c| c.is_ascii_digit())
}
