//! Health gating for replica calls.
//!
//! The gate consults an external per-target health state and fails fast
//! without attempting the RPC when the target is marked unhealthy. It is a
//! pure short-circuit: probing and state transitions happen elsewhere and
//! are written into a shared [`HealthBoard`] (or any other
//! [`HealthOracle`] implementation).

use crate::client::querier::{QuerierClient, QueryContext};
use crate::core::error::{QuiverError, QuiverResult};
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-target health state, maintained by an external prober.
pub trait HealthOracle: Send + Sync {
    /// Whether the endpoint is currently believed healthy.
    ///
    /// Unknown endpoints are healthy: gating must never block traffic to a
    /// target that has not been probed yet.
    fn is_healthy(&self, endpoint: &str) -> bool;
}

/// Shared endpoint → health map for probers to write into.
#[derive(Debug, Default)]
pub struct HealthBoard {
    targets: RwLock<HashMap<String, bool>>,
}

impl HealthBoard {
    /// Create an empty board; every endpoint starts healthy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the probed health of an endpoint.
    pub fn set_healthy(&self, endpoint: &str, healthy: bool) {
        self.targets.write().insert(endpoint.to_string(), healthy);
    }

    /// Forget an endpoint, reverting it to healthy-by-default.
    pub fn forget(&self, endpoint: &str) {
        self.targets.write().remove(endpoint);
    }
}

impl HealthOracle for HealthBoard {
    fn is_healthy(&self, endpoint: &str) -> bool {
        self.targets.read().get(endpoint).copied().unwrap_or(true)
    }
}

/// Health-gate layer wrapping a querier client.
pub struct HealthGated<C> {
    inner: C,
    endpoint: String,
    oracle: Arc<dyn HealthOracle>,
}

impl<C> HealthGated<C> {
    /// Gate `inner` on the oracle's view of `endpoint`.
    pub fn new(inner: C, endpoint: impl Into<String>, oracle: Arc<dyn HealthOracle>) -> Self {
        Self {
            inner,
            endpoint: endpoint.into(),
            oracle,
        }
    }
}

#[async_trait]
impl<C: QuerierClient> QuerierClient for HealthGated<C> {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        if !self.oracle.is_healthy(&self.endpoint) {
            return Err(QuiverError::TargetUnhealthy {
                endpoint: self.endpoint.clone(),
            });
        }
        self.inner.query_exemplars(ctx, request).await
    }
}
