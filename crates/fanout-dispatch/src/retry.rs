//! Exponential backoff retry execution with jitter.
//!
//! Wraps one logical send in a bounded retry loop. Transient errors are
//! retried with exponentially increasing delays; permanent errors
//! propagate immediately. Sleeps go through the injected clock so tests
//! run on virtual time.

use std::{future::Future, time::Duration};

use fanout_core::Clock;
use rand::Rng;

use crate::error::{DeliveryError, Result};

/// Retry policy for a single delivery attempt.
///
/// Defines how transient delivery failures are retried: total attempt
/// ceiling, backoff base, delay cap, and jitter. One policy instance is
/// shared by all channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,

    /// Base delay for exponential backoff calculation.
    pub base_delay: Duration,

    /// Maximum delay between attempts.
    pub max_delay: Duration,

    /// Jitter percentage (0.0 to 1.0) to add randomness.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Calculates the delay before the attempt following `attempt`
    /// (1-based).
    ///
    /// Delay doubles each attempt starting from `base_delay`, capped at
    /// `max_delay`, then jittered. With defaults the progression is
    /// 1s, 2s, 4s, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let multiplier = 2_u32.saturating_pow(exponent);
        let base_delay = self.base_delay * multiplier;

        let capped_delay = std::cmp::min(base_delay, self.max_delay);
        let jittered_delay = apply_jitter(capped_delay, self.jitter_factor);

        std::cmp::min(jittered_delay, self.max_delay)
    }

    /// Runs `op` under this policy.
    ///
    /// Retries only errors whose `is_retryable()` returns true, sleeping
    /// the backoff delay between attempts via `clock`. Permanent errors
    /// propagate immediately. Once the attempt ceiling is reached the
    /// last transient error is wrapped in `RetriesExhausted`.
    pub async fn run<T, F, Fut>(&self, clock: &dyn Clock, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    if attempt >= self.max_attempts {
                        return Err(DeliveryError::retries_exhausted(attempt, error));
                    }

                    let delay = self.backoff_delay(attempt);
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms,
                        error = %error,
                        "transient delivery failure, retrying after backoff"
                    );

                    clock.sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }
}

/// Applies jitter to a duration to prevent thundering herd effects.
///
/// Randomizes the delay by ±jitter_factor percentage. For example, with
/// jitter_factor=0.25, a 10s delay becomes 7.5s to 12.5s randomly.
fn apply_jitter(duration: Duration, jitter_factor: f64) -> Duration {
    if jitter_factor <= 0.0 {
        return duration;
    }

    let clamped_jitter = jitter_factor.clamp(0.0, 1.0);

    let mut rng = rand::rng();
    let jitter_range = duration.as_secs_f64() * clamped_jitter;
    let jitter_offset = rng.random_range(-jitter_range..=jitter_range);
    let jittered_secs = duration.as_secs_f64() + jitter_offset;

    Duration::from_secs_f64(jittered_secs.max(0.0))
}
