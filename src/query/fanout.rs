//! Fan-out dispatch across a replica set.
//!
//! The dispatcher resolves the replica endpoints for a shard, issues the
//! same query concurrently to every replica through cached client stacks,
//! and collects responses under a failure-tolerance policy: per-replica
//! errors are logged and dropped, and the overall read fails only when
//! fewer than the configured minimum of successful responses is held by
//! the deadline.
//!
//! Responses are handed to the merger in replica-list order, never arrival
//! order, so the merged output is deterministic for a fixed replica
//! ordering regardless of network timing.

use crate::client::querier::QueryContext;
use crate::client::stack::QuerierFactory;
use crate::core::config::FanOutConfig;
use crate::core::error::{QuiverError, QuiverResult};
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use crate::query::merge::merge_exemplar_responses;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Supplies the ordered replica endpoints holding a shard.
///
/// Endpoint ordering is part of the read contract: it fixes both the
/// merge input order and the first-wins tie-break.
pub trait ReplicaResolver: Send + Sync {
    /// Resolve a shard key to its replica endpoints, in canonical order.
    fn resolve(&self, shard_key: &str) -> QuiverResult<Vec<String>>;
}

/// Resolver returning one fixed replica set for every shard. Suitable for
/// single-shard deployments and tests; production deployments plug in a
/// ring-backed resolver.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    endpoints: Vec<String>,
}

impl StaticResolver {
    /// Create a resolver over a fixed endpoint list.
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

impl ReplicaResolver for StaticResolver {
    fn resolve(&self, _shard_key: &str) -> QuiverResult<Vec<String>> {
        Ok(self.endpoints.clone())
    }
}

/// Fans a query out to all replicas of a shard and merges the answers.
pub struct Distributor {
    resolver: Arc<dyn ReplicaResolver>,
    factory: Arc<dyn QuerierFactory>,
    config: FanOutConfig,
}

impl Distributor {
    /// Create a dispatcher over a resolver and a client factory.
    pub fn new(
        resolver: Arc<dyn ReplicaResolver>,
        factory: Arc<dyn QuerierFactory>,
        config: FanOutConfig,
    ) -> Self {
        Self {
            resolver,
            factory,
            config,
        }
    }

    /// Execute one fan-out/merge cycle.
    ///
    /// Returns the merged response, shaped identically to a per-replica
    /// response so callers need no awareness that merging occurred.
    pub async fn query_exemplars(
        &self,
        shard_key: &str,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        if request.end_timestamp_ms < request.start_timestamp_ms {
            return Err(QuiverError::invalid_query(format!(
                "end timestamp {} precedes start timestamp {}",
                request.end_timestamp_ms, request.start_timestamp_ms
            )));
        }

        let endpoints = self.resolver.resolve(shard_key)?;
        let total = endpoints.len();
        let required = self.config.min_success;
        if total < required {
            return Err(QuiverError::InsufficientReplicas {
                received: 0,
                required,
            });
        }

        let ctx = QueryContext::with_timeout(self.config.deadline());
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<ExemplarQueryResponse>> = vec![None; total];
        let mut failed = 0usize;

        for (index, endpoint) in endpoints.iter().enumerate() {
            match self.factory.querier(endpoint) {
                Ok(client) => {
                    let request = request.clone();
                    let endpoint = endpoint.clone();
                    join_set.spawn(async move {
                        let result = client.query_exemplars(&ctx, request).await;
                        (index, endpoint, result)
                    });
                }
                Err(err) => {
                    tracing::warn!(endpoint, error = %err, "dropping replica: no client");
                    failed += 1;
                }
            }
        }

        let mut received = 0usize;
        loop {
            // Quorum arithmetically unreachable: stop waiting.
            if failed > total - required {
                break;
            }
            match tokio::time::timeout_at(ctx.deadline(), join_set.join_next()).await {
                Err(_) => {
                    tracing::warn!(
                        shard_key,
                        received,
                        "fan-out deadline expired with calls in flight"
                    );
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok((index, _endpoint, Ok(response))))) => {
                    slots[index] = Some(response);
                    received += 1;
                }
                Ok(Some(Ok((index, endpoint, Err(err))))) => {
                    tracing::warn!(
                        endpoint,
                        replica_index = index,
                        error = %err,
                        "dropping replica response"
                    );
                    failed += 1;
                }
                Ok(Some(Err(join_err))) => {
                    tracing::warn!(error = %join_err, "replica task aborted");
                    failed += 1;
                }
            }
        }
        // Abandon whatever is still in flight; late responses are discarded.
        drop(join_set);

        if received < required {
            return Err(QuiverError::InsufficientReplicas { received, required });
        }

        let responses: Vec<ExemplarQueryResponse> = slots.into_iter().flatten().collect();
        Ok(merge_exemplar_responses(responses))
    }
}
