//! Channel-to-sender routing.
//!
//! The registry is assembled once at startup from the full sender list
//! and consulted by every delivery task. Registering two senders for the
//! same channel silently keeps the last one; duplicates are a wiring
//! error best caught in review, and the overwrite is deterministic.

use std::{collections::HashMap, sync::Arc};

use fanout_core::Channel;

use crate::{
    error::{DeliveryError, Result},
    senders::ChannelSender,
};

/// Immutable mapping from channel to its registered sender.
#[derive(Debug, Clone)]
pub struct SenderRegistry {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    /// Builds a registry from the given senders.
    ///
    /// Later senders win on channel collisions.
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        let mut map: HashMap<Channel, Arc<dyn ChannelSender>> = HashMap::new();
        for sender in senders {
            map.insert(sender.channel(), sender);
        }

        tracing::info!(channels = map.len(), "sender registry initialized");

        Self { senders: map }
    }

    /// Resolves the sender for a channel.
    pub fn resolve(&self, channel: Channel) -> Result<Arc<dyn ChannelSender>> {
        self.senders
            .get(&channel)
            .cloned()
            .ok_or(DeliveryError::ChannelUnsupported { channel })
    }

    /// Returns true if a sender is registered for the channel.
    pub fn supports(&self, channel: Channel) -> bool {
        self.senders.contains_key(&channel)
    }

    /// Channels with a registered sender, in arbitrary order.
    pub fn supported_channels(&self) -> Vec<Channel> {
        self.senders.keys().copied().collect()
    }
}
