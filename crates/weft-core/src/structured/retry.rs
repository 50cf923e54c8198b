//! Generic exponential-backoff retry loop with a correction hook.
//!
//! The operation's `on_failure` hook runs between attempts and may mutate
//! the operation (e.g. swap in corrected parameters). It is not invoked
//! after the final attempt. Cancellation during a backoff sleep aborts
//! immediately.

use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::request::{models, ModelId};

/// Retry behavior configuration.
///
/// `max_retries = 0` means a single attempt with no retry. `retry_backoff`
/// multiplies the delay after each sleep; it must be >= 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub retry_backoff: f64,
    /// Model used for correction calls between attempts.
    pub model: ModelId,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
            retry_backoff: 2.0,
            model: ModelId::from(models::CLAUDE_4_SONNET),
        }
    }
}

impl RetryConfig {
    pub fn new(
        model: impl Into<ModelId>,
        max_retries: u32,
        retry_delay: Duration,
        retry_backoff: f64,
    ) -> Self {
        Self {
            max_retries,
            retry_delay,
            retry_backoff,
            model: model.into(),
        }
    }
}

/// An operation the retrier can drive.
#[async_trait]
pub trait Retryable: Send {
    type Output: Send;

    /// Performs one attempt.
    async fn attempt(&mut self, ctx: &Context, attempt: u32) -> Result<Self::Output, Error>;

    /// Runs after a failed attempt, before the next one. Returning an error
    /// aborts the whole loop.
    async fn on_failure(&mut self, ctx: &Context, attempt: u32, error: &Error)
        -> Result<(), Error>;
}

pub struct Retrier<O: Retryable> {
    config: RetryConfig,
    operation: O,
}

impl<O: Retryable> Retrier<O> {
    pub fn new(config: RetryConfig, operation: O) -> Self {
        Self { config, operation }
    }

    pub async fn execute(mut self, ctx: &Context) -> Result<O::Output, Error> {
        let mut delay = self.config.retry_delay;
        let mut attempt: u32 = 0;

        loop {
            match self.operation.attempt(ctx, attempt).await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.config.max_retries {
                        return Err(Error::RetriesExhausted {
                            retries: self.config.max_retries,
                            source: Box::new(error),
                        });
                    }

                    self.operation.on_failure(ctx, attempt, &error).await?;
                }
            }

            attempt += 1;

            tokio::select! {
                _ = ctx.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {
                    delay = delay.mul_f64(self.config.retry_backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingOperation {
        fail_first: u32,
        attempts: Arc<AtomicU32>,
        failure_hooks: Arc<AtomicU32>,
    }

    impl CountingOperation {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                attempts: Arc::new(AtomicU32::new(0)),
                failure_hooks: Arc::new(AtomicU32::new(0)),
            }
        }

        fn counters(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
            (self.attempts.clone(), self.failure_hooks.clone())
        }
    }

    #[async_trait]
    impl Retryable for CountingOperation {
        type Output = u32;

        async fn attempt(&mut self, _ctx: &Context, attempt: u32) -> Result<u32, Error> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(Error::Provider("transient".to_string()));
            }
            Ok(attempt)
        }

        async fn on_failure(
            &mut self,
            _ctx: &Context,
            _attempt: u32,
            _error: &Error,
        ) -> Result<(), Error> {
            self.failure_hooks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config(max_retries: u32) -> RetryConfig {
        RetryConfig::new(
            models::CLAUDE_4_SONNET,
            max_retries,
            Duration::from_millis(100),
            2.0,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retries() {
        let ctx = Context::new();
        let retrier = Retrier::new(config(3), CountingOperation::new(2));

        let result = retrier.execute(&ctx).await.unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let ctx = Context::new();
        let operation = CountingOperation::new(1);
        let (attempts, failure_hooks) = operation.counters();

        let error = Retrier::new(config(0), operation)
            .execute(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::RetriesExhausted { retries: 0, .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        // The hook never runs when no attempt follows the failure.
        assert_eq!(failure_hooks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_error() {
        let ctx = Context::new();
        let operation = CountingOperation::new(10);
        let (attempts, failure_hooks) = operation.counters();

        let error = Retrier::new(config(2), operation)
            .execute(&ctx)
            .await
            .unwrap_err();
        match error {
            Error::RetriesExhausted { retries, source } => {
                assert_eq!(retries, 2);
                assert!(matches!(*source, Error::Provider(_)));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(failure_hooks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_forms_geometric_series() {
        let ctx = Context::new();
        let retrier = Retrier::new(config(3), CountingOperation::new(3));

        let started = Instant::now();
        retrier.execute(&ctx).await.unwrap();

        // 100ms + 200ms + 400ms of virtual sleep.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(700), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(800), "elapsed: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_sleep_aborts() {
        let ctx = Context::new();
        ctx.cancel();

        let retrier = Retrier::new(config(5), CountingOperation::new(10));
        let error = retrier.execute(&ctx).await.unwrap_err();
        assert!(matches!(error, Error::Cancelled));
    }

    struct AbortingOperation;

    #[async_trait]
    impl Retryable for AbortingOperation {
        type Output = ();

        async fn attempt(&mut self, _ctx: &Context, _attempt: u32) -> Result<(), Error> {
            Err(Error::Provider("always".to_string()))
        }

        async fn on_failure(
            &mut self,
            _ctx: &Context,
            _attempt: u32,
            _error: &Error,
        ) -> Result<(), Error> {
            Err(Error::Correction("correction failed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failure_hook_error_short_circuits() {
        let ctx = Context::new();
        let retrier = Retrier::new(config(3), AbortingOperation);

        let error = retrier.execute(&ctx).await.unwrap_err();
        assert!(matches!(error, Error::Correction(_)));
    }
}
