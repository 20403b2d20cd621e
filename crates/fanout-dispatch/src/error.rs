//! Error types for notification dispatch operations.
//!
//! Defines all error conditions that can occur while fanning a message
//! out: validation failures, missing or malformed contact details,
//! transient provider outages, circuit breaker states, and storage
//! problems. Errors include context for debugging and proper
//! categorization for retry decisions.

use fanout_core::Channel;
use thiserror::Error;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Error types for notification dispatch operations.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Message content was empty or whitespace-only.
    #[error("message content must not be empty")]
    EmptyContent,

    /// No sender is registered for the requested channel.
    #[error("no sender registered for channel {channel}")]
    ChannelUnsupported {
        /// Channel with no registered sender
        channel: Channel,
    },

    /// Recipient has no contact detail for the channel.
    #[error("recipient has no contact information for channel {channel}")]
    MissingContact {
        /// Channel missing a contact detail
        channel: Channel,
    },

    /// Recipient's contact detail is malformed for the channel.
    #[error("invalid contact for channel {channel}: {detail}")]
    InvalidContact {
        /// Channel the contact detail belongs to
        channel: Channel,
        /// Description of what is malformed
        detail: String,
    },

    /// Composed payload exceeds the channel's size limit.
    #[error("payload size {size} exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Composed payload size in bytes
        size: usize,
        /// Channel's maximum payload size in bytes
        limit: usize,
    },

    /// Simulated provider outage for the channel.
    #[error("{channel} service temporarily unavailable")]
    ServiceUnavailable {
        /// Channel whose provider is unavailable
        channel: Channel,
    },

    /// All retry attempts exhausted.
    #[error("delivery failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made, including the initial one
        attempts: u32,
        /// Last error returned by the sender
        #[source]
        source: Box<DeliveryError>,
    },

    /// Circuit breaker is open, delivery blocked.
    #[error("circuit breaker open for channel {channel}")]
    CircuitOpen {
        /// Channel with the open circuit
        channel: Channel,
    },

    /// Message or outcome store operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Storage error message
        message: String,
    },
}

impl DeliveryError {
    /// Creates a channel-unsupported error.
    pub fn channel_unsupported(channel: Channel) -> Self {
        Self::ChannelUnsupported { channel }
    }

    /// Creates a missing-contact error.
    pub fn missing_contact(channel: Channel) -> Self {
        Self::MissingContact { channel }
    }

    /// Creates an invalid-contact error with a description.
    pub fn invalid_contact(channel: Channel, detail: impl Into<String>) -> Self {
        Self::InvalidContact { channel, detail: detail.into() }
    }

    /// Creates a payload-too-large error.
    pub fn payload_too_large(size: usize, limit: usize) -> Self {
        Self::PayloadTooLarge { size, limit }
    }

    /// Creates a service-unavailable error.
    pub fn service_unavailable(channel: Channel) -> Self {
        Self::ServiceUnavailable { channel }
    }

    /// Creates a retries-exhausted error wrapping the final failure.
    pub fn retries_exhausted(attempts: u32, source: DeliveryError) -> Self {
        Self::RetriesExhausted { attempts, source: Box::new(source) }
    }

    /// Creates a circuit-open error.
    pub fn circuit_open(channel: Channel) -> Self {
        Self::CircuitOpen { channel }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    /// Determines if this error represents a temporary failure that
    /// should be retried.
    ///
    /// Only provider outages are transient. Validation failures, missing
    /// or malformed contacts, and circuit breaker states describe
    /// conditions a retry cannot change.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServiceUnavailable { .. } => true,

            Self::EmptyContent
            | Self::ChannelUnsupported { .. }
            | Self::MissingContact { .. }
            | Self::InvalidContact { .. }
            | Self::PayloadTooLarge { .. }
            | Self::RetriesExhausted { .. }
            | Self::CircuitOpen { .. }
            | Self::Storage { .. } => false,
        }
    }
}
