//! Error types and transience classification.
//!
//! Quiver distinguishes errors that are fatal to a single replica call from
//! errors that are fatal to the whole fan-out. Per-replica failures
//! (connection loss, admission rejection, retry exhaustion, unhealthy
//! target) are absorbed by the dispatcher and logged; only a quorum failure
//! or an invalid query reaches the caller.

use thiserror::Error;
use tonic::{Code, Status};

/// Common Quiver error conditions.
#[derive(Debug, Error)]
pub enum QuiverError {
    /// Unknown compression codec name in the client configuration.
    ///
    /// Rejected at validation time, before any connection attempt.
    #[error("unsupported compression type: {name}")]
    UnsupportedCompression { name: String },

    /// Channel construction or transport-level dial failure.
    #[error("connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Client-side admission rejection: no rate-limit token was available
    /// within the call's deadline.
    #[error("rate limited: no token available within deadline")]
    RateLimited,

    /// The health oracle marked the target unhealthy; no RPC was attempted.
    #[error("target unhealthy: {endpoint}")]
    TargetUnhealthy { endpoint: String },

    /// An RPC failed with a gRPC status.
    #[error("rpc failed: {0}")]
    Rpc(#[from] Status),

    /// The retry budget was exhausted; carries the last observed error.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<QuiverError>,
    },

    /// Too few successful replica responses were collected by the deadline.
    #[error("insufficient replica responses: got {received}, need {required}")]
    InsufficientReplicas { received: usize, required: usize },

    /// The query itself is malformed.
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    /// Payload compression or decompression failed.
    #[error("compression error: {message}")]
    Compression { message: String },
}

/// Convenience alias used throughout the crate.
pub type QuiverResult<T> = Result<T, QuiverError>;

impl QuiverError {
    /// Create a Connection error.
    pub fn connection(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidQuery error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Whether the retry layer should re-attempt a call that failed with
    /// this error.
    ///
    /// Connection failures and `Unavailable`/`Aborted` statuses are
    /// transient. Rate-limit rejections (client admission or server
    /// `ResourceExhausted`) are transient only when `retry_on_ratelimits`
    /// is set. Everything else, including `InvalidArgument` and
    /// `PermissionDenied`, returns immediately.
    pub fn is_transient(&self, retry_on_ratelimits: bool) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::RateLimited => retry_on_ratelimits,
            Self::Rpc(status) => match status.code() {
                Code::Unavailable | Code::Aborted => true,
                Code::ResourceExhausted => retry_on_ratelimits,
                _ => false,
            },
            _ => false,
        }
    }
}
