//! Exponential back-off with jitter between unit attempts.

use std::time::Duration;

use crate::error::SourceError;

const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per unit, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base_ms,
        }
    }

    /// Whether another attempt may follow `failed_attempt` (1-based) after
    /// `err`.
    #[must_use]
    pub fn should_retry(&self, failed_attempt: u32, err: &SourceError) -> bool {
        err.is_transient() && failed_attempt < self.max_attempts
    }

    /// Sleep before the attempt following `failed_attempt`.
    ///
    /// With `backoff_base_ms = 1_000`:
    ///
    /// | Failed attempt | Sleep                        |
    /// |----------------|------------------------------|
    /// | 1              | 1 000 ms × 2⁰ ± 25 % jitter |
    /// | 2              | 1 000 ms × 2¹ ± 25 % jitter |
    /// | 3              | 1 000 ms × 2² ± 25 % jitter |
    ///
    /// Capped at 60 s. A rate-limit hint from the source is honoured as a
    /// lower bound.
    #[must_use]
    pub fn delay_after(&self, failed_attempt: u32, err: &SourceError) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(10);
        let capped = self
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(MAX_DELAY_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

        let floor_ms = match err {
            SourceError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
            _ => 0,
        };
        Duration::from_millis(jittered.max(floor_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1_000)
    }
}
