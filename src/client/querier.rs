//! Querier client trait and its gRPC implementation.
//!
//! The fan-out dispatcher and the interceptor layers speak to replicas
//! through [`QuerierClient`]; `GrpcQuerier` is the transport-backed
//! implementation issuing the unary RPC through the shared channel with
//! the custom codec and message-size ceilings applied.

use crate::client::codec::WireCodec;
use crate::client::compression::Compression;
use crate::core::config::GrpcClientConfig;
use crate::core::error::{QuiverError, QuiverResult};
use crate::model::proto::{ExemplarQueryRequest, ExemplarQueryResponse};
use async_trait::async_trait;
use tokio::time::Instant;
use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

/// RPC path of the exemplar query method.
const QUERY_EXEMPLARS_PATH: &str = "/quiver.Querier/QueryExemplars";

/// Per-call context carrying the caller's deadline.
///
/// Interceptors bound their waiting (rate-limit token wait, backoff sleep)
/// by this deadline and never block past it.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    deadline: Instant,
}

impl QueryContext {
    /// Context expiring after `timeout` from now.
    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    /// The absolute deadline.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline; zero if it has passed.
    pub fn remaining(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// A client able to answer one exemplar query against one replica.
#[async_trait]
pub trait QuerierClient: Send + Sync {
    /// Issue the query, bounded by the context's deadline.
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse>;
}

/// gRPC-backed querier client for a single replica endpoint.
pub struct GrpcQuerier {
    endpoint: String,
    channel: Channel,
    compression: Compression,
    max_recv_msg_size: usize,
    max_send_msg_size: usize,
}

impl GrpcQuerier {
    /// Wrap a channel built by the connection manager.
    pub fn new(
        endpoint: impl Into<String>,
        channel: Channel,
        config: &GrpcClientConfig,
        compression: Compression,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel,
            compression,
            max_recv_msg_size: config.max_recv_msg_size,
            max_send_msg_size: config.max_send_msg_size,
        }
    }
}

#[async_trait]
impl QuerierClient for GrpcQuerier {
    async fn query_exemplars(
        &self,
        ctx: &QueryContext,
        request: ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        let mut grpc = Grpc::new(self.channel.clone())
            .max_decoding_message_size(self.max_recv_msg_size)
            .max_encoding_message_size(self.max_send_msg_size);

        grpc.ready()
            .await
            .map_err(|err| QuiverError::connection(&self.endpoint, err))?;

        let codec: WireCodec<ExemplarQueryRequest, ExemplarQueryResponse> =
            WireCodec::new(self.compression);
        let path = PathAndQuery::from_static(QUERY_EXEMPLARS_PATH);

        let mut request = tonic::Request::new(request);
        request.set_timeout(ctx.remaining());

        let response = grpc.unary(request, path, codec).await?;
        Ok(response.into_inner())
    }
}
