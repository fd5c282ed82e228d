//! Wraps any [`InferenceAdapter`] with rate limiting and retry/backoff.

use async_trait::async_trait;

use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;
use crate::traits::{AdapterMetadata, AdapterResult, AdapterStream, InferenceAdapter, InferenceRequest};

/// An [`InferenceAdapter`] wrapped with a shared [`RateLimiter`] and a
/// per-call [`RetryPolicy`].
///
/// This is the adapter shape the inference runner actually holds: every
/// vendor adapter gets one of these around it so rate limiting and retry
/// behavior is identical across providers instead of being reimplemented
/// per vendor.
pub struct RateLimitedAdapter<A> {
    inner: A,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl<A: InferenceAdapter> RateLimitedAdapter<A> {
    /// Wraps `inner` with the given rate limit and retry policy.
    #[must_use]
    pub fn new(inner: A, max_calls_per_second: f64, retry: RetryPolicy) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(max_calls_per_second),
            retry,
        }
    }

    /// Returns the wrapped adapter.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: InferenceAdapter> InferenceAdapter for RateLimitedAdapter<A> {
    fn metadata(&self) -> &AdapterMetadata {
        self.inner.metadata()
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        self.limiter.apply_rate_limiting().await;
        self.inner.infer(request).await
    }

    async fn call_model(&self, request: InferenceRequest) -> AdapterResult<String> {
        let provider = self.inner.metadata().provider();
        self.retry
            .run(provider, || async {
                self.limiter.apply_rate_limiting().await;
                self.inner.call_model(request.clone()).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{AdapterError, InferenceChunk, MessageRole, PromptMessage};
    use futures::stream;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyAdapter {
        metadata: AdapterMetadata,
        failures_remaining: AtomicU32,
    }

    #[async_trait]
    impl InferenceAdapter for FlakyAdapter {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn infer(&self, _request: InferenceRequest) -> AdapterResult<AdapterStream> {
            if self.failures_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(AdapterError::transport("flaky"));
            }
            Ok(Box::pin(stream::once(async {
                Ok(InferenceChunk::new("ok", true))
            })))
        }
    }

    #[tokio::test]
    async fn retries_through_rate_limiter() {
        let adapter = RateLimitedAdapter::new(
            FlakyAdapter {
                metadata: AdapterMetadata::new("test", "mock"),
                failures_remaining: AtomicU32::new(2),
            },
            1000.0,
            RetryPolicy {
                max_retries: 3,
                initial_backoff: std::time::Duration::from_millis(1),
            },
        );

        let request =
            InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, "hi")]).unwrap();
        let result = adapter.call_model(request).await.unwrap();
        assert_eq!(result, "ok");
    }
}
