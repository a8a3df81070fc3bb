//! Configuration parsing and validation.
//!
//! Quiver configuration is loaded from TOML files with programmatic
//! overrides. The client section is immutable and process-wide: it is
//! created once at startup, validated before any connection attempt, and
//! shared read-only by every channel.

use crate::client::compression::Compression;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level Quiver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// gRPC client configuration, shared by all replica channels.
    #[serde(default)]
    pub client: GrpcClientConfig,

    /// Fan-out policy.
    #[serde(default)]
    pub fanout: FanOutConfig,
}

/// Configuration for the gRPC client used to reach storage replicas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcClientConfig {
    /// Upper bound on a single RPC response, in bytes.
    #[serde(default = "default_max_recv_msg_size")]
    pub max_recv_msg_size: usize,

    /// Upper bound on a single RPC request, in bytes.
    #[serde(default = "default_max_send_msg_size")]
    pub max_send_msg_size: usize,

    /// Compression codec name: one of "", "gzip", "snappy", "snappy-block",
    /// "zstd". The empty string disables compression.
    #[serde(default)]
    pub compression: String,

    /// Per-channel call admission rate in requests/second; 0 disables the
    /// rate limiter entirely.
    #[serde(default)]
    pub rate_limit: f64,

    /// Token bucket capacity for the rate limiter.
    #[serde(default)]
    pub rate_limit_burst: usize,

    /// Whether rate-limit rejections are retried with backoff.
    #[serde(default)]
    pub backoff_on_ratelimits: bool,

    /// Backoff parameters for the retry layer.
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Enable TLS on replica channels. When false, connections are
    /// unauthenticated and unencrypted.
    #[serde(default)]
    pub tls_enabled: bool,

    /// TLS material, consulted only when `tls_enabled` is set.
    #[serde(default)]
    pub tls: TlsClientConfig,

    /// Maximum time to establish a connection, in milliseconds. A value of
    /// 0 means the transport's default connect timeout is used.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Backoff parameters governing retries of transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Seed delay for the exponential schedule, in milliseconds.
    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,

    /// Cap on the exponential schedule, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Maximum number of retries after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// TLS material for replica channels.
///
/// Paths are read by the credential provider at channel-build time; an
/// unreadable file fails that channel's call, not the whole fan-out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsClientConfig {
    /// CA bundle used to verify the replica's certificate.
    #[serde(default)]
    pub ca_path: Option<String>,

    /// Client certificate chain for mTLS.
    #[serde(default)]
    pub cert_path: Option<String>,

    /// Client private key for mTLS.
    #[serde(default)]
    pub key_path: Option<String>,

    /// Expected server name, overriding the one derived from the endpoint.
    #[serde(default)]
    pub server_name: Option<String>,
}

/// Fan-out policy for replica reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    /// Minimum number of successful replica responses required for the
    /// overall read to succeed. Supplied by the deployment's replication
    /// policy.
    #[serde(default = "default_min_success")]
    pub min_success: usize,

    /// Overall deadline for one fan-out/merge cycle, in milliseconds.
    #[serde(default = "default_fanout_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_max_recv_msg_size() -> usize {
    100 * 1024 * 1024
}

fn default_max_send_msg_size() -> usize {
    16 * 1024 * 1024
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_min_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    10
}

fn default_min_success() -> usize {
    1
}

fn default_fanout_deadline_ms() -> u64 {
    30_000
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            max_recv_msg_size: default_max_recv_msg_size(),
            max_send_msg_size: default_max_send_msg_size(),
            compression: String::new(),
            rate_limit: 0.0,
            rate_limit_burst: 0,
            backoff_on_ratelimits: false,
            backoff: BackoffConfig::default(),
            tls_enabled: false,
            tls: TlsClientConfig::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: default_min_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            min_success: default_min_success(),
            deadline_ms: default_fanout_deadline_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.fanout.validate()?;
        Ok(())
    }
}

impl GrpcClientConfig {
    /// Resolve the configured codec name to a [`Compression`] variant.
    pub fn compression(&self) -> Result<Compression, crate::core::error::QuiverError> {
        self.compression.parse()
    }

    /// Connect timeout as a duration; `None` means transport default.
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connect_timeout_ms))
        }
    }

    /// Validate the client configuration.
    pub fn validate(&self) -> Result<()> {
        if let Err(err) = self.compression() {
            anyhow::bail!("{err}");
        }

        if self.rate_limit > 0.0 && self.rate_limit_burst == 0 {
            anyhow::bail!("client.rate_limit_burst must be > 0 when client.rate_limit is set");
        }

        if self.backoff.min_backoff_ms > self.backoff.max_backoff_ms {
            anyhow::bail!(
                "client.backoff.min_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
                self.backoff.min_backoff_ms,
                self.backoff.max_backoff_ms
            );
        }

        if self.tls_enabled {
            // mTLS needs both halves of the identity.
            match (&self.tls.cert_path, &self.tls.key_path) {
                (Some(_), None) => {
                    anyhow::bail!("client.tls.key_path required when tls.cert_path is set")
                }
                (None, Some(_)) => {
                    anyhow::bail!("client.tls.cert_path required when tls.key_path is set")
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl BackoffConfig {
    /// Seed delay for the exponential schedule.
    pub fn min_backoff(&self) -> Duration {
        Duration::from_millis(self.min_backoff_ms)
    }

    /// Cap on the exponential schedule.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl FanOutConfig {
    /// Overall deadline for one fan-out/merge cycle.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Validate the fan-out policy.
    pub fn validate(&self) -> Result<()> {
        if self.min_success == 0 {
            anyhow::bail!("fanout.min_success must be > 0");
        }
        Ok(())
    }
}
