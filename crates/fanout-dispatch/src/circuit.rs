//! Circuit breaker implementation for channel failure protection.
//!
//! Provides per-channel circuit breakers that fail fast during provider
//! outages and gradually test recovery. A failing SMS gateway must not
//! block email delivery, so each channel gets its own breaker.
//!
//! # Circuit Breaker State Machine
//!
//! ```text
//!                          ┌─────────────────────────┐
//!                          │        CLOSED           │
//!                          │   (Normal Operation)    │
//!                          │                         │
//!                          │ ● All requests allowed  │
//!                          │ ● Counting failures     │
//!                          └─────────────────────────┘
//!                           │                        ▲
//!                           │                        │
//!             5 consecutive │                        │ 3 successes
//!                  failures │                        │
//!                           ▼                        │
//!    ┌─────────────────────────┐                  ┌───────────────────────┐
//!    │         OPEN            │                  │       HALF-OPEN       │
//!    │      (Fail Fast)        │   60s cooldown   │   (Testing Recovery)  │
//!    │                         │ ───────────────▶ │                       │
//!    │ ● All requests blocked  │                  │ ● Requests allowed    │
//!    │ ● Immediate failure     │                  │ ● Any failure reopens │
//!    └─────────────────────────┘                  └───────────────────────┘
//! ```

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use fanout_core::{Channel, Clock};
use tokio::sync::Mutex;

/// Circuit breaker configuration shared by all channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitConfig {
    /// Number of consecutive failures to trigger circuit open.
    pub failure_threshold: u32,
    /// Time to wait before transitioning from Open to Half-Open.
    pub cooldown: Duration,
    /// Number of consecutive successes to close circuit from Half-Open.
    pub success_threshold: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            success_threshold: 3,
        }
    }
}

/// Current state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - all requests allowed.
    Closed,
    /// Channel unhealthy - requests fail immediately.
    Open,
    /// Testing recovery - requests allowed, any failure reopens.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// State and counters for a single channel's circuit breaker.
#[derive(Debug, Clone)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    last_failure_at: Option<Instant>,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            last_failure_at: None,
        }
    }

    fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.half_open_successes = 0;
        self.last_failure_at = None;
    }
}

/// Thread-safe circuit breaker manager for all channels.
///
/// Manages circuit breaker state per channel. Uses internal locking so
/// concurrent delivery tasks can check and record outcomes safely.
#[derive(Debug)]
pub struct CircuitBreakerManager {
    config: CircuitConfig,
    clock: Arc<dyn Clock>,
    circuits: Mutex<HashMap<Channel, BreakerState>>,
}

impl CircuitBreakerManager {
    /// Creates a new circuit breaker manager with the given configuration.
    pub fn new(config: CircuitConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock, circuits: Mutex::new(HashMap::new()) }
    }

    /// Determines if a request should be allowed on the given channel.
    ///
    /// Returns `true` if the request should proceed, `false` if the
    /// circuit breaker should block it. An Open circuit whose cooldown
    /// has elapsed transitions to Half-Open here and allows the request.
    pub async fn allow_request(&self, channel: Channel) -> bool {
        let mut circuits = self.circuits.lock().await;
        let breaker = circuits.entry(channel).or_insert_with(BreakerState::new);

        match breaker.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = breaker
                    .last_failure_at
                    .is_some_and(|at| self.clock.now().duration_since(at) >= self.config.cooldown);

                if cooled_down {
                    Self::transition_to_half_open(channel, breaker);
                    true
                } else {
                    false
                }
            },
        }
    }

    /// Records a successful delivery outcome for the channel.
    ///
    /// Resets the failure counter and potentially closes the circuit
    /// from Half-Open once the success threshold is reached.
    pub async fn record_success(&self, channel: Channel) {
        let mut circuits = self.circuits.lock().await;
        let breaker = circuits.entry(channel).or_insert_with(BreakerState::new);

        breaker.consecutive_failures = 0;

        match breaker.state {
            CircuitState::Closed => {},
            CircuitState::Open => {
                tracing::warn!(%channel, "recorded success for open circuit");
            },
            CircuitState::HalfOpen => {
                breaker.half_open_successes += 1;

                if breaker.half_open_successes >= self.config.success_threshold {
                    Self::transition_to_closed(channel, breaker);
                }
            },
        }
    }

    /// Records a failed delivery outcome for the channel.
    ///
    /// Increments the consecutive-failure counter and opens the circuit
    /// at the threshold, or immediately on any Half-Open failure.
    pub async fn record_failure(&self, channel: Channel) {
        let mut circuits = self.circuits.lock().await;
        let breaker = circuits.entry(channel).or_insert_with(BreakerState::new);

        breaker.consecutive_failures += 1;
        breaker.last_failure_at = Some(self.clock.now());

        match breaker.state {
            CircuitState::Closed => {
                if breaker.consecutive_failures >= self.config.failure_threshold {
                    Self::transition_to_open(channel, breaker);
                }
            },
            CircuitState::Open => {},
            CircuitState::HalfOpen => {
                Self::transition_to_open(channel, breaker);
            },
        }
    }

    /// Returns the current state of a channel's circuit.
    ///
    /// Channels with no recorded traffic report Closed.
    pub async fn state(&self, channel: Channel) -> CircuitState {
        let circuits = self.circuits.lock().await;
        circuits.get(&channel).map_or(CircuitState::Closed, |breaker| breaker.state)
    }

    /// Forces a circuit to the specified state (for testing/admin purposes).
    pub async fn force_state(&self, channel: Channel, state: CircuitState) {
        let mut circuits = self.circuits.lock().await;
        let breaker = circuits.entry(channel).or_insert_with(BreakerState::new);

        breaker.state = state;
        breaker.half_open_successes = 0;

        if state == CircuitState::Open {
            breaker.last_failure_at = Some(self.clock.now());
        }
    }

    /// Forces a circuit back to Closed and zeroes all counters.
    pub async fn reset(&self, channel: Channel) {
        let mut circuits = self.circuits.lock().await;
        let breaker = circuits.entry(channel).or_insert_with(BreakerState::new);
        breaker.reset();

        tracing::info!(%channel, "circuit breaker reset");
    }

    fn transition_to_open(channel: Channel, breaker: &mut BreakerState) {
        tracing::warn!(
            %channel,
            consecutive_failures = breaker.consecutive_failures,
            "circuit breaker opening"
        );

        breaker.state = CircuitState::Open;
        breaker.half_open_successes = 0;
    }

    fn transition_to_half_open(channel: Channel, breaker: &mut BreakerState) {
        tracing::info!(%channel, "circuit breaker transitioning to half-open");

        breaker.state = CircuitState::HalfOpen;
        breaker.half_open_successes = 0;
    }

    fn transition_to_closed(channel: Channel, breaker: &mut BreakerState) {
        tracing::info!(%channel, "circuit breaker closing - channel recovered");

        breaker.reset();
    }
}
