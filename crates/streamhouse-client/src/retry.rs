//! Retry Logic with Exponential Backoff
//!
//! Registry round trips made while binding a producer or consumer to a topic
//! schema are retried when the registry is temporarily unreachable.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  bind_async(...)     │ SchemaBinding
//! └──────┬───────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────┐
//! │  RetryPolicy                 │
//! │  - max_retries: 3            │
//! │  - initial_backoff: 100ms    │
//! │  - max_backoff: 5s           │
//! │  - backoff_multiplier: 2.0   │
//! └──────┬───────────────────────┘
//!        │
//!        ├─→ Attempt 1: Immediate
//!        ├─→ Attempt 2: Wait 100ms (backoff)
//!        ├─→ Attempt 3: Wait 200ms (backoff * 2)
//!        └─→ Attempt 4: Wait 400ms (backoff * 4)
//! ```
//!
//! ## Retryable vs Non-Retryable Errors
//!
//! **Retryable**: `RegistryUnavailable` only.
//!
//! **Non-Retryable**: everything else. An `IncompatibleSchema` verdict is
//! final, and `Timeout` is the deadline of the whole operation, so retrying
//! inside it would only overrun the deadline.
//!
//! ## Examples
//!
//! ```ignore
//! use streamhouse_client::retry::{RetryPolicy, retry_with_backoff};
//!
//! let policy = RetryPolicy::default();
//!
//! let schema = retry_with_backoff(&policy, || async {
//!     registry.fetch_active_schema("orders").await.map_err(ClientError::from)
//! }).await?;
//! ```

use crate::error::ClientError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration for exponential backoff.
///
/// # Backoff Calculation
///
/// ```text
/// backoff = min(initial_backoff * multiplier^attempt, max_backoff)
/// ```
///
/// With `jitter` set, each wait is scaled by a random factor in `[0.75, 1.25)`
/// so that many clients recovering from the same registry outage do not
/// retry in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: usize,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier for exponential growth
    pub backoff_multiplier: f64,

    /// Randomize each backoff by ±25%
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: usize,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
            jitter: false,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate backoff duration for a given attempt number (0-indexed).
    ///
    /// ```ignore
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(0), Duration::from_millis(100));
    /// assert_eq!(policy.backoff(1), Duration::from_millis(200));
    /// ```
    pub fn backoff(&self, attempt: usize) -> Duration {
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        backoff.min(self.max_backoff)
    }

    fn jittered_backoff(&self, attempt: usize) -> Duration {
        let base = self.backoff(attempt);
        let jitter = 0.75 + (rand::random::<f64>() * 0.5); // 0.75-1.25x
        Duration::from_millis((base.as_millis() as f64 * jitter) as u64)
    }

    /// Check if an error is worth another attempt under this policy.
    pub fn is_retryable(&self, error: &ClientError) -> bool {
        matches!(error, ClientError::RegistryUnavailable(_))
    }
}

/// Retry an operation with exponential backoff.
///
/// # Behavior
///
/// 1. Try operation
/// 2. If success, return result
/// 3. If error is non-retryable, return error immediately
/// 4. If retries remain, sleep for the (optionally jittered) backoff and retry
/// 5. If all retries exhausted, return last error
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if !policy.is_retryable(&error) {
                    return Err(error);
                }

                if attempt >= policy.max_retries {
                    warn!(
                        attempt = attempt + 1,
                        max_retries = policy.max_retries,
                        error = %error,
                        "Max retries exhausted, giving up"
                    );
                    return Err(error);
                }

                let backoff = if policy.jitter {
                    policy.jittered_backoff(attempt)
                } else {
                    policy.backoff(attempt)
                };
                warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis(),
                    error = %error,
                    "Retryable error, backing off"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
