//! Resilient gRPC client layer for replica reads.
//!
//! - [`channel`] - Channel lifecycle: TLS, keepalive, connect timeout
//! - [`compression`] - Closed codec set and payload compression
//! - [`codec`] - gRPC codec over the hand-rolled wire types
//! - [`querier`] - Client trait and transport implementation
//! - [`ratelimit`] - Client-side admission control
//! - [`retry`] - Bounded exponential-backoff retry
//! - [`health`] - Health-gated short-circuit
//! - [`stack`] - Ordered layer composition and caching

pub mod channel;
pub mod codec;
pub mod compression;
pub mod health;
pub mod querier;
pub mod ratelimit;
pub mod retry;
pub mod stack;
