//! Exponential-backoff retry wrapper around a single model call.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::traits::{AdapterError, AdapterResult};

/// Retry policy for a single adapter's calls.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Number of retries attempted after the first failure.
    pub max_retries: u32,
    /// Base used in `initial_backoff * 2^attempt`.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `wait(k) = initial_backoff * 2^k + uniform(0, 1)` for the k-th retry.
    fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * 2f64.powi(attempt as i32);
        let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
        Duration::from_secs_f64(base + jitter)
    }

    /// Calls `f` up to `1 + max_retries` times, retrying only on
    /// [`AdapterError`] variants that [`is_retryable`] accepts, with
    /// exponential backoff between attempts.
    ///
    /// # Errors
    ///
    /// Returns the triggering error immediately for a non-retryable failure,
    /// or [`AdapterError::MaxRetriesExceeded`] once the retry budget for a
    /// retryable failure is exhausted.
    pub async fn run<F, Fut, T>(&self, provider: &str, mut f: F) -> AdapterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retryable(&err) => return Err(err),
                Err(err) if attempt < self.max_retries => {
                    let wait = self.backoff_for(attempt);
                    warn!(
                        provider,
                        attempt,
                        max_retries = self.max_retries,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "retrying model call after failure"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(AdapterError::max_retries_exceeded(
                        self.max_retries,
                        err.to_string(),
                    ));
                }
            }
        }
    }
}

/// Reports whether `err` belongs to a category worth retrying.
///
/// Mirrors the source's explicit error-code branch (`ThrottlingException`,
/// `ModelErrorException`, `ServiceUnavailableException` retried; anything
/// else raised immediately): only transient, upstream-caused failures are
/// retryable. Configuration, malformed requests, malformed responses, and
/// context-window overflows are fatal and propagate on the first attempt.
#[must_use]
pub fn is_retryable(err: &AdapterError) -> bool {
    matches!(
        err,
        AdapterError::Transport { .. } | AdapterError::RateLimited { .. }
    )
}
