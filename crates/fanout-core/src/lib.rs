//! Core domain models for the fanout notification dispatcher.
//!
//! Provides strongly-typed domain primitives, delivery records, and the
//! clock abstraction used for deterministic testing. All other crates
//! depend on these foundational types for type safety and consistency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod models;
pub mod time;

pub use models::{
    Category, Channel, DeliveryOutcome, DeliveryStatus, Message, MessageId, Recipient, RecipientId,
};
pub use time::{Clock, RealClock, TestClock};
