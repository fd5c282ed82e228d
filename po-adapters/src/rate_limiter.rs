//! Sliding-window rate limiter shared by all inference adapters.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::sleep;

/// Thread-safe sliding-window rate limiter.
///
/// Tracks call timestamps over a rolling one-second window and a count of
/// in-flight waiters, so that concurrent callers sharing the same limiter
/// spread out rather than all firing the instant the window frees up.
pub struct RateLimiter {
    max_calls_per_second: f64,
    state: Mutex<State>,
}

struct State {
    timestamps: VecDeque<Instant>,
    waiters: u32,
}

impl RateLimiter {
    /// Builds a limiter allowing at most `max_calls_per_second` calls.
    #[must_use]
    pub fn new(max_calls_per_second: f64) -> Self {
        Self {
            max_calls_per_second,
            state: Mutex::new(State {
                timestamps: VecDeque::new(),
                waiters: 0,
            }),
        }
    }

    /// Blocks the caller until it is that caller's turn within the rate
    /// budget, then records the call. A non-positive `max_calls_per_second`
    /// disables the limiter entirely.
    pub async fn apply_rate_limiting(&self) {
        if self.max_calls_per_second <= 0.0 {
            return;
        }

        let sleep_for = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            let now = Instant::now();

            while let Some(&oldest) = state.timestamps.front() {
                if now.duration_since(oldest) > Duration::from_secs(1) {
                    state.timestamps.pop_front();
                } else {
                    break;
                }
            }

            if state.timestamps.len() < self.max_calls_per_second as usize {
                state.timestamps.push_back(now);
                return;
            }

            state.waiters += 1;
            let waiters = f64::from(state.waiters);

            let oldest_age = state
                .timestamps
                .front()
                .map_or(0.0, |&oldest| now.duration_since(oldest).as_secs_f64());

            let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
            let wait = waiters / self.max_calls_per_second - oldest_age + jitter;

            state.waiters -= 1;
            state.timestamps.push_back(now);

            wait
        };

        if sleep_for > 0.0 {
            sleep(Duration::from_secs_f64(sleep_for)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_does_not_block_long() {
        let limiter = RateLimiter::new(100.0);
        let start = Instant::now();
        limiter.apply_rate_limiting().await;
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn sequential_calls_stay_under_budget() {
        let limiter = RateLimiter::new(1000.0);
        for _ in 0..5 {
            limiter.apply_rate_limiting().await;
        }
    }

    #[tokio::test]
    async fn non_positive_rate_disables_the_limiter() {
        let limiter = RateLimiter::new(0.0);
        let start = Instant::now();
        for _ in 0..50 {
            limiter.apply_rate_limiting().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn calls_under_budget_never_wait() {
        let limiter = RateLimiter::new(10.0);
        let start = Instant::now();
        for _ in 0..9 {
            limiter.apply_rate_limiting().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
