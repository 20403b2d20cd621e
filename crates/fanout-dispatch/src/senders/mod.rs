//! Channel senders: the provider-facing edge of the dispatcher.
//!
//! Each sender simulates one delivery provider (mail relay, SMS gateway,
//! push service) with a configurable transient failure probability and
//! the provider's own contact validation rules. Senders are stateless
//! and shared across delivery tasks behind `Arc`.

use async_trait::async_trait;
use fanout_core::{Channel, Message, Recipient};
use rand::Rng as _;

use crate::error::Result;

mod email;
mod push;
mod sms;

pub use email::EmailSender;
pub use push::PushSender;
pub use sms::SmsSender;

/// A sender capable of delivering messages over one channel.
///
/// Implementations validate the recipient's contact details for their
/// channel and perform (or simulate) the provider call. Transient
/// provider outages surface as `ServiceUnavailable` so the retry policy
/// can distinguish them from permanent failures.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    /// The channel this sender delivers on.
    fn channel(&self) -> Channel;

    /// Delivers `message` to `recipient` over this sender's channel.
    async fn send(&self, message: &Message, recipient: &Recipient) -> Result<()>;
}

/// Rolls the simulated provider outage dice.
///
/// Returns true when the provider should be reported unavailable for
/// this call. A rate of 0.0 never fires, 1.0 always fires.
pub(crate) fn provider_outage(failure_rate: f64) -> bool {
    failure_rate > 0.0 && rand::rng().random_bool(failure_rate.clamp(0.0, 1.0))
}
