//! Quiver - Replica fan-out and quorum-merge read path.
//!
//! Quiver is the read-path core of a horizontally-scalable, multi-tenant
//! time-series monitoring backend. It fans an exemplar query out to the
//! replicated storage nodes holding one data shard, tolerates partial node
//! failure, and deterministically merges the per-replica answers into one
//! canonical, deduplicated result. The client layer beneath it absorbs
//! transient failures (bounded backoff retry), protects storage nodes from
//! overload (client-side rate limiting), and manages channel lifecycle
//! (TLS, keepalive, compression, health gating).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Fan-Out Dispatcher                        │
//! │        (replica resolution, concurrency, quorum policy)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Interceptor Stack                          │
//! │      rate limit │ backoff retry │ health gate (per endpoint)    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Connection Manager                         │
//! │     channel cache │ TLS │ keepalive │ codec │ size limits       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Response Merger                           │
//! │        first-wins dedup, deterministic series ordering          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error types and transience classification
//!
//! ## Model
//! - [`model::proto`] - Hand-rolled protobuf wire types
//! - [`model::labels`] - Label canonicalization and fingerprints
//!
//! ## Client
//! - [`client::channel`] - Channel cache, TLS, keepalive
//! - [`client::compression`] - Closed compression codec set
//! - [`client::codec`] - gRPC codec with payload compression
//! - [`client::querier`] - Querier client trait and gRPC transport
//! - [`client::ratelimit`] - Token-bucket admission control
//! - [`client::retry`] - Bounded exponential-backoff retry
//! - [`client::health`] - Health-gated short-circuit
//! - [`client::stack`] - Ordered interceptor composition
//!
//! ## Query
//! - [`query::fanout`] - Concurrent replica dispatch under quorum policy
//! - [`query::merge`] - Deterministic deduplicating merge
//!
//! # Key Invariants
//!
//! - **FIRST-WINS**: on duplicate timestamps within a series, the exemplar
//!   from the earliest-processed input is retained
//! - **REPLICA-ORDER**: merge input order is replica-list order, never
//!   arrival order
//! - **DEADLINE-BOUND**: interceptors wait (tokens, backoff) only within
//!   the caller's deadline
//! - **QUORUM-OR-ERROR**: a read returns merged data from at least
//!   `min_success` replicas or an insufficient-replicas error, never a
//!   silent partial result below quorum

// Core infrastructure
pub mod core;

// Data model and wire types
pub mod model;

// Resilient client layer
pub mod client;

// Fan-out and merge
pub mod query;

// Re-exports for convenience
pub use self::core::{config, error};
pub use client::{channel, codec, compression, health, querier, ratelimit, retry, stack};
pub use query::{fanout, merge};
