//! Notification fan-out engine with reliability guarantees.
//!
//! This crate implements the dispatch system that fans a single message
//! out to every recipient subscribed to its category, across each
//! recipient's enabled channels, with retry logic and per-channel
//! circuit breakers.
//!
//! # Architecture
//!
//! One dispatch spawns one async task per (recipient, channel) pair.
//! Each task handles the complete delivery lifecycle:
//!
//! 1. **Resolve Sender** - Look up the channel's sender in the registry
//! 2. **Circuit Check** - Verify the channel circuit breaker allows it
//! 3. **Send** - Invoke the sender under the retry policy
//! 4. **Record Outcome** - Persist one success or failure record
//!
//! Task failures never escape the task boundary; they become failure
//! records and counter increments, and the dispatch call returns an
//! aggregate summary once every task has joined.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fanout_core::{Category, RealClock};
//! use fanout_dispatch::{
//!     DispatchConfig, DispatchEngine, EmailSender, InMemoryDirectory, InMemoryMessageStore,
//!     InMemoryOutcomeStore, PushSender, SenderRegistry, SmsSender,
//! };
//!
//! # async fn example() -> Result<(), fanout_dispatch::DeliveryError> {
//! let registry = SenderRegistry::new(vec![
//!     Arc::new(EmailSender::new()),
//!     Arc::new(SmsSender::new()),
//!     Arc::new(PushSender::new()),
//! ]);
//!
//! let engine = DispatchEngine::new(
//!     Arc::new(InMemoryDirectory::with_sample_recipients()),
//!     Arc::new(registry),
//!     Arc::new(InMemoryMessageStore::new()),
//!     Arc::new(InMemoryOutcomeStore::new()),
//!     DispatchConfig::default(),
//!     Arc::new(RealClock::new()),
//! );
//!
//! let summary = engine.dispatch(Category::Sports, "Final score: 3-1").await?;
//! println!("delivered to {} recipients", summary.total_recipients);
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod directory;
pub mod engine;
pub mod error;
pub mod retry;
pub mod senders;
pub mod store;
pub mod strategy;

// Re-export main public API
pub use circuit::{CircuitBreakerManager, CircuitConfig, CircuitState};
pub use directory::{InMemoryDirectory, RecipientDirectory};
pub use engine::{DispatchConfig, DispatchEngine, DispatchSummary};
pub use error::{DeliveryError, Result};
pub use retry::RetryPolicy;
pub use senders::{ChannelSender, EmailSender, PushSender, SmsSender};
pub use store::{InMemoryMessageStore, InMemoryOutcomeStore, MessageStore, OutcomeStore};
pub use strategy::SenderRegistry;
