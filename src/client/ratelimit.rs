//! Client-side admission control.
//!
//! A token bucket bounds the outbound call rate per replica stack. The
//! bucket is shared mutable state across concurrent calls on the same
//! channel; updates go through a mutex. A caller that cannot obtain a
//! token before its deadline fails with [`QuiverError::RateLimited`]
//! rather than blocking indefinitely.

use crate::client::querier::{QuerierClient, QueryContext};
use crate::core::error::{QuiverError, QuiverResult};
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Token bucket refilling at `rate` tokens/second up to `burst` capacity.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    updated_at: Instant,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    pub fn new(rate: f64, burst: usize) -> Self {
        Self {
            rate,
            burst: burst as f64,
            state: Mutex::new(BucketState {
                tokens: burst as f64,
                updated_at: Instant::now(),
            }),
        }
    }

    /// Take one token now, or report how long until one is available.
    pub fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.updated_at);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.rate).min(self.burst);
        state.updated_at = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
        }
    }

    /// Take one token, waiting if necessary but never past the deadline.
    pub async fn take(&self, ctx: &QueryContext) -> QuiverResult<()> {
        loop {
            match self.try_take() {
                Ok(()) => return Ok(()),
                Err(wait) => {
                    if wait >= ctx.remaining() {
                        return Err(QuiverError::RateLimited);
                    }
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Admission-control layer wrapping a querier client.
pub struct RateLimited<C> {
    inner: C,
    bucket: Arc<TokenBucket>,
}

impl<C> RateLimited<C> {
    /// Wrap `inner` behind a shared token bucket.
    pub fn new(inner: C, bucket: Arc<TokenBucket>) -> Self {
        Self { inner, bucket }
    }
}

#[async_trait]
impl<C: QuerierClient> QuerierClient for RateLimited<C> {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        self.bucket.take(ctx).await?;
        self.inner.query_exemplars(ctx, request).await
    }
}
