use std::future::Future;
use std::time::Duration;

/// One attempt's outcome: success, a permanent failure that must not be
/// retried, or a retryable failure.
pub enum Attempt<T, E> {
    Success(T),
    Permanent(E),
    Retryable(E),
}

/// Owns the sleep loop and the attempt count for a bounded retry
/// sequence — the "small `retry(operation, policy)` helper" called for
/// in the design notes, replacing patch-decorated HTTP sessions.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Retrieval's policy: 1s, 2s, 4s, 8s, 16s, 32s — doubling, capped at
    /// 32s, at most 5 attempts.
    pub fn exponential() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            backoff_factor: 2.0,
            max_attempts: 5,
        }
    }

    /// Classification's policy: constant 1s delay between attempts
    /// (`backoff_factor=1`), at most 5 attempts.
    pub fn linear() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_attempts: 5,
        }
    }

    /// The delay sequence this policy would produce, ignoring the final
    /// (unused) delay after the last attempt. Exposed for tests.
    pub fn delay_sequence(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut delay = self.initial_delay;
        for _ in 1..self.max_attempts {
            delays.push(delay);
            let next = delay.as_secs_f64() * self.backoff_factor;
            delay = Duration::from_secs_f64(next.min(self.max_delay.as_secs_f64()));
        }
        delays
    }
}

/// Runs `op` up to `policy.max_attempts` times. `op` is given the 1-based
/// attempt number and must classify its own result via [`Attempt`].
/// Returns the last error untouched on exhaustion — callers decide
/// whether that means "leave for redelivery" or "mark N/A and proceed".
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut delay = policy.initial_delay;
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Attempt::Success(v) => return Ok(v),
            Attempt::Permanent(e) => return Err(e),
            Attempt::Retryable(e) => {
                last_err = Some(e);
                if attempt == policy.max_attempts {
                    break;
                }
                tokio::time::sleep(delay).await;
                let next = delay.as_secs_f64() * policy.backoff_factor;
                delay = Duration::from_secs_f64(next.min(policy.max_delay.as_secs_f64()));
            }
        }
    }

    Err(last_err.expect("max_attempts >= 1 guarantees at least one retryable outcome"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn exponential_delays_are_prefix_of_geometric_sequence_capped_at_32() {
        let policy = RetryPolicy::exponential();
        assert_eq!(
            policy.delay_sequence(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn linear_delays_stay_constant() {
        let policy = RetryPolicy::linear();
        assert_eq!(
            policy.delay_sequence(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let policy = RetryPolicy::linear();
        let result: Result<u32, &str> = retry(&policy, |_attempt| async { Attempt::Success(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::exponential();
        let result: Result<u32, &str> = retry(&policy, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Permanent("not found") }
        })
        .await;
        assert_eq!(result, Err("not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_failure_exhausts_all_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_attempts: 3,
        };
        let result: Result<u32, &str> = retry(&policy, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Retryable("timeout") }
        })
        .await;
        assert_eq!(result, Err("timeout"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
