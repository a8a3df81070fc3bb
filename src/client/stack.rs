//! Per-endpoint call stack assembly.
//!
//! The interceptor chain is order-dependent middleware: it is built once
//! per endpoint as an explicit sequence of wrapping layers, then cached so
//! that the token bucket and channel are shared by every call to that
//! endpoint.
//!
//! Layer order, outermost first:
//! - retry, then rate limit, when `backoff_on_ratelimits` is set, so
//!   admission rejections are visible to the retry layer;
//! - rate limit, then retry, otherwise, so admission rejections propagate
//!   immediately and unlimited calls never reach the network;
//! - the health gate sits innermost, directly over the transport, so a
//!   known-bad peer is refused before any RPC attempt or backoff cycle.

use crate::client::channel::ChannelManager;
use crate::client::health::{HealthGated, HealthOracle};
use crate::client::querier::{GrpcQuerier, QuerierClient, QueryContext};
use crate::client::ratelimit::{RateLimited, TokenBucket};
use crate::client::retry::Retrying;
use crate::core::config::GrpcClientConfig;
use crate::core::error::QuiverResult;
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[async_trait]
impl QuerierClient for Arc<dyn QuerierClient> {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        (**self).query_exemplars(ctx, request).await
    }
}

/// Call counters shared by all stacks of one factory.
#[derive(Debug, Default)]
pub struct StackStats {
    issued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of [`StackStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackStatsSnapshot {
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl StackStats {
    fn snapshot(&self) -> StackStatsSnapshot {
        StackStatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Outermost layer recording call outcomes.
struct Instrumented {
    inner: Arc<dyn QuerierClient>,
    stats: Arc<StackStats>,
}

#[async_trait]
impl QuerierClient for Instrumented {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        self.stats.issued.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.query_exemplars(ctx, request).await;
        match &result {
            Ok(_) => self.stats.succeeded.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }
}

/// Compose the interceptor layers around a transport-level client.
pub fn build_stack(
    endpoint: &str,
    transport: Arc<dyn QuerierClient>,
    config: &GrpcClientConfig,
    oracle: Option<Arc<dyn HealthOracle>>,
) -> Arc<dyn QuerierClient> {
    let mut client: Arc<dyn QuerierClient> = transport;

    if let Some(oracle) = oracle {
        client = Arc::new(HealthGated::new(client, endpoint, oracle));
    }

    let rate_limited = |inner: Arc<dyn QuerierClient>| -> Arc<dyn QuerierClient> {
        let bucket = Arc::new(TokenBucket::new(config.rate_limit, config.rate_limit_burst));
        Arc::new(RateLimited::new(inner, bucket))
    };
    let retrying = |inner: Arc<dyn QuerierClient>| -> Arc<dyn QuerierClient> {
        Arc::new(Retrying::new(
            inner,
            config.backoff.clone(),
            config.backoff_on_ratelimits,
        ))
    };

    if config.backoff_on_ratelimits {
        if config.rate_limit > 0.0 {
            client = rate_limited(client);
        }
        client = retrying(client);
    } else {
        client = retrying(client);
        if config.rate_limit > 0.0 {
            client = rate_limited(client);
        }
    }

    client
}

/// Obtains the ready-to-call client stack for a replica endpoint.
pub trait QuerierFactory: Send + Sync {
    /// Get or build the stack for `endpoint`.
    fn querier(&self, endpoint: &str) -> QuiverResult<Arc<dyn QuerierClient>>;
}

/// Factory backed by the channel manager; stacks are built on first use
/// and cached per endpoint.
pub struct GrpcQuerierFactory {
    channels: ChannelManager,
    oracle: Option<Arc<dyn HealthOracle>>,
    stats: Arc<StackStats>,
    stacks: RwLock<HashMap<String, Arc<dyn QuerierClient>>>,
}

impl GrpcQuerierFactory {
    /// Create a factory without health gating.
    pub fn new(channels: ChannelManager) -> Self {
        Self::with_oracle(channels, None)
    }

    /// Create a factory whose stacks consult a health oracle.
    pub fn with_oracle(channels: ChannelManager, oracle: Option<Arc<dyn HealthOracle>>) -> Self {
        Self {
            channels,
            oracle,
            stats: Arc::new(StackStats::default()),
            stacks: RwLock::new(HashMap::new()),
        }
    }

    /// Aggregate call counters across all endpoints.
    pub fn stats(&self) -> StackStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drop cached stacks and channels. Called once at process shutdown.
    pub fn shutdown(&self) {
        self.stacks.write().clear();
        self.channels.shutdown();
    }
}

impl QuerierFactory for GrpcQuerierFactory {
    fn querier(&self, endpoint: &str) -> QuiverResult<Arc<dyn QuerierClient>> {
        if let Some(stack) = self.stacks.read().get(endpoint) {
            return Ok(stack.clone());
        }

        let mut stacks = self.stacks.write();
        if let Some(stack) = stacks.get(endpoint) {
            return Ok(stack.clone());
        }

        let channel = self.channels.channel(endpoint)?;
        let transport: Arc<dyn QuerierClient> = Arc::new(GrpcQuerier::new(
            endpoint,
            channel,
            self.channels.config(),
            self.channels.compression(),
        ));
        let stack = Arc::new(Instrumented {
            inner: build_stack(
                endpoint,
                transport,
                self.channels.config(),
                self.oracle.clone(),
            ),
            stats: self.stats.clone(),
        });
        stacks.insert(endpoint.to_string(), stack.clone());
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GrpcClientConfig;
    use crate::core::error::QuiverError;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tonic::Status;

    /// Scripted client returning canned results in order.
    struct Scripted {
        results: Mutex<Vec<QuiverResult<ExemplarQueryResponse>>>,
    }

    #[async_trait]
    impl QuerierClient for Scripted {
        async fn query_exemplars(
            &self,
            _ctx: &QueryContext,
            _request: ExemplarQueryRequest,
        ) -> QuiverResult<ExemplarQueryResponse> {
            let mut results = self.results.lock();
            if results.is_empty() {
                Ok(ExemplarQueryResponse::default())
            } else {
                results.remove(0)
            }
        }
    }

    // Stack construction needs a tokio runtime for the lazy channels.
    #[tokio::test]
    async fn stacks_are_cached_per_endpoint() {
        let channels = ChannelManager::new(GrpcClientConfig::default()).expect("manager");
        let factory = GrpcQuerierFactory::new(channels);
        let a = factory.querier("replica-1:9095").expect("stack");
        let b = factory.querier("replica-1:9095").expect("stack");
        assert!(Arc::ptr_eq(&a, &b));
        factory.querier("replica-2:9095").expect("stack");
        assert_eq!(factory.stacks.read().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_clears_stacks_and_channels() {
        let channels = ChannelManager::new(GrpcClientConfig::default()).expect("manager");
        let factory = GrpcQuerierFactory::new(channels);
        factory.querier("replica-1:9095").expect("stack");
        factory.shutdown();
        assert_eq!(factory.stacks.read().len(), 0);
        assert_eq!(factory.channels.channel_count(), 0);
    }

    #[tokio::test]
    async fn stats_count_call_outcomes() {
        let stats = Arc::new(StackStats::default());
        let inner: Arc<dyn QuerierClient> = Arc::new(Scripted {
            results: Mutex::new(vec![
                Ok(ExemplarQueryResponse::default()),
                Err(QuiverError::Rpc(Status::unavailable("down"))),
            ]),
        });
        let instrumented = Instrumented {
            inner,
            stats: stats.clone(),
        };

        let ctx = QueryContext::with_timeout(Duration::from_secs(1));
        instrumented
            .query_exemplars(&ctx, ExemplarQueryRequest::default())
            .await
            .expect("first call");
        instrumented
            .query_exemplars(&ctx, ExemplarQueryRequest::default())
            .await
            .unwrap_err();

        assert_eq!(
            stats.snapshot(),
            StackStatsSnapshot {
                issued: 2,
                succeeded: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn factory_stats_record_failed_calls() {
        let mut config = GrpcClientConfig::default();
        // Nothing listens on port 1; fail on the first attempt.
        config.backoff.max_retries = 0;
        let channels = ChannelManager::new(config).expect("manager");
        let factory = GrpcQuerierFactory::new(channels);

        let stack = factory.querier("127.0.0.1:1").expect("stack");
        let ctx = QueryContext::with_timeout(Duration::from_secs(5));
        stack
            .query_exemplars(&ctx, ExemplarQueryRequest::default())
            .await
            .unwrap_err();

        let stats = factory.stats();
        assert_eq!(stats.issued, 1);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 1);
    }
}
