//! Simulated email delivery through a mail relay.

use async_trait::async_trait;
use fanout_core::{Channel, Message, Recipient};

use super::{provider_outage, ChannelSender};
use crate::error::{DeliveryError, Result};

/// Default probability of a simulated relay outage per send.
const DEFAULT_FAILURE_RATE: f64 = 0.05;

/// Email sender backed by a simulated mail relay.
#[derive(Debug, Clone)]
pub struct EmailSender {
    failure_rate: f64,
}

impl EmailSender {
    /// Creates an email sender with the default outage rate.
    pub fn new() -> Self {
        Self { failure_rate: DEFAULT_FAILURE_RATE }
    }

    /// Creates an email sender with a custom outage rate.
    ///
    /// Tests use 0.0 for deterministic success and 1.0 for a permanently
    /// unavailable relay.
    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self { failure_rate }
    }
}

impl Default for EmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, message: &Message, recipient: &Recipient) -> Result<()> {
        let Some(address) = recipient.email_address() else {
            return Err(DeliveryError::missing_contact(Channel::Email));
        };

        tracing::info!(
            recipient = %recipient.name,
            address,
            category = %message.category,
            "sending email"
        );

        if provider_outage(self.failure_rate) {
            return Err(DeliveryError::service_unavailable(Channel::Email));
        }

        if !is_valid_email(address) {
            return Err(DeliveryError::invalid_contact(
                Channel::Email,
                format!("malformed address: {address}"),
            ));
        }

        let mail = format!(
            "To: {address}\nSubject: Notification - {}\nBody: {}",
            message.category.display_name(),
            message.content
        );
        tracing::debug!(mail, "email composed");

        Ok(())
    }
}

/// Address shape check: a non-empty local part of `[A-Za-z0-9+_.-]`
/// followed by `@` and a non-empty domain.
fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use fanout_core::Category;

    use super::*;
    use crate::senders::test_support::{message, recipient};

    #[tokio::test]
    async fn delivers_to_valid_address() {
        let sender = EmailSender::with_failure_rate(0.0);
        let result = sender
            .send(
                &message(Category::Finance, "Markets up 2%"),
                &recipient("jane@example.com", ""),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_address_rejected_before_provider_call() {
        // Outage rate 1.0 would fire if the provider were reached
        let sender = EmailSender::with_failure_rate(1.0);
        let result = sender.send(&message(Category::Sports, "Kickoff"), &recipient("", "")).await;
        assert!(matches!(result, Err(DeliveryError::MissingContact { channel: Channel::Email })));
    }

    #[tokio::test]
    async fn outage_reported_as_service_unavailable() {
        let sender = EmailSender::with_failure_rate(1.0);
        let result = sender
            .send(&message(Category::Sports, "Kickoff"), &recipient("jane@example.com", ""))
            .await;
        assert!(matches!(
            result,
            Err(DeliveryError::ServiceUnavailable { channel: Channel::Email })
        ));
    }

    #[tokio::test]
    async fn malformed_address_rejected() {
        let sender = EmailSender::with_failure_rate(0.0);
        let result = sender
            .send(&message(Category::Movies, "New release"), &recipient("not-an-address", ""))
            .await;
        assert!(matches!(result, Err(DeliveryError::InvalidContact { .. })));
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("john.doe@example.com"));
        assert!(is_valid_email("a+b_c-d@x"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("john@"));
        assert!(!is_valid_email("spa ce@example.com"));
    }
}
