//! Bounded exponential-backoff retry.
//!
//! Wraps a single unary call with retry on transient failure. Delays grow
//! exponentially from the configured minimum to the maximum, with jitter,
//! and are always clamped to the caller's deadline. Non-transient errors
//! return immediately; exhausting the retry budget surfaces the last
//! observed error tagged as retry-exhausted.

use crate::client::querier::{QuerierClient, QueryContext};
use crate::core::config::BackoffConfig;
use crate::core::error::{QuiverError, QuiverResult};
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Retry layer wrapping a querier client.
pub struct Retrying<C> {
    inner: C,
    backoff: BackoffConfig,
    retry_on_ratelimits: bool,
}

impl<C> Retrying<C> {
    /// Wrap `inner` with the given backoff policy.
    ///
    /// `retry_on_ratelimits` extends the transient error class to
    /// admission rejections and server resource exhaustion.
    pub fn new(inner: C, backoff: BackoffConfig, retry_on_ratelimits: bool) -> Self {
        Self {
            inner,
            backoff,
            retry_on_ratelimits,
        }
    }
}

/// Apply jitter: a uniformly random delay in [base/2, base].
fn jittered(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.5..=1.0);
    base.mul_f64(factor)
}

#[async_trait]
impl<C: QuerierClient> QuerierClient for Retrying<C> {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        let mut delay = self.backoff.min_backoff();
        let max_delay = self.backoff.max_backoff();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let err = match self.inner.query_exemplars(ctx, request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_transient(self.retry_on_ratelimits) {
                return Err(err);
            }

            if attempts > self.backoff.max_retries {
                return Err(QuiverError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let sleep = jittered(delay);
            if sleep >= ctx.remaining() {
                // No room for another attempt before the deadline.
                return Err(err);
            }

            tracing::debug!(
                attempt = attempts,
                backoff_ms = sleep.as_millis() as u64,
                error = %err,
                "retrying transient failure"
            );
            tokio::time::sleep(sleep).await;
            delay = (delay * 2).min(max_delay);
        }
    }
}
