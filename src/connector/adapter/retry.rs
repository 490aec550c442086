use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bounded retry with exponential backoff.
///
/// The delay before attempt `n + 1` is
/// `initial_backoff_ms * backoff_multiplier^n`, capped at `max_backoff_ms`,
/// then scaled by `1 + U[-jitter_factor, +jitter_factor]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f32,
    #[serde(default)]
    pub jitter_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let pow = self.backoff_multiplier.max(1.0).powi(exponent);
        let delay_ms = ((self.initial_backoff_ms as f32 * pow) as u64).min(self.max_backoff_ms);

        let jitter = self.jitter_factor.clamp(0.0, 1.0);
        if jitter > 0.0 && delay_ms > 0 {
            let scale: f32 = rand::thread_rng().gen_range(-jitter..=jitter);
            let jitter_ms = (delay_ms as f32 * scale).round() as i64;
            let adjusted = (delay_ms as i64 + jitter_ms).max(0) as u64;
            return Duration::from_millis(adjusted);
        }

        Duration::from_millis(delay_ms)
    }
}

/// Runs `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the policy runs out of attempts. The last outcome is returned.
///
/// `operation` receives the 0-based attempt index.
pub async fn retry_with_backoff<Op, Fut, T, E, ShouldRetry>(
    policy: &RetryPolicy,
    mut operation: Op,
    should_retry: ShouldRetry,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ShouldRetry: Fn(&E) -> bool,
{
    let max = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let next_attempt = attempt + 1;
        if next_attempt >= max || !should_retry(&err) {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        debug!(
            attempt = attempt,
            next_attempt = next_attempt,
            delay_ms = delay.as_millis() as u64,
            "Retry backoff"
        );
        tokio::time::sleep(delay).await;

        attempt = next_attempt;
    }
}
