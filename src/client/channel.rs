//! Replica channel management.
//!
//! One long-lived channel per replica endpoint, created lazily on first
//! use, shared by all subsequent calls to that endpoint, and torn down at
//! process shutdown. The manager owns the endpoint → channel cache
//! explicitly; there is no ambient global state.

use crate::client::compression::Compression;
use crate::core::config::{GrpcClientConfig, TlsClientConfig};
use crate::core::error::{QuiverError, QuiverResult};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};

/// Keepalive ping interval. Fixed, not configurable: exists to detect dead
/// peers promptly.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Keepalive ping timeout. Fixed alongside [`KEEPALIVE_INTERVAL`].
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplies transport security material for replica channels.
pub trait TlsProvider: Send + Sync {
    /// Build the TLS settings for a channel from the client TLS config.
    fn credentials(&self, config: &TlsClientConfig) -> Result<ClientTlsConfig>;
}

/// Default provider reading PEM material from the configured paths.
#[derive(Debug, Default)]
pub struct FileTlsProvider;

impl TlsProvider for FileTlsProvider {
    fn credentials(&self, config: &TlsClientConfig) -> Result<ClientTlsConfig> {
        let mut tls = ClientTlsConfig::new();

        if let Some(ref ca_path) = config.ca_path {
            let pem = std::fs::read(ca_path)
                .with_context(|| format!("failed to read CA bundle: {ca_path}"))?;
            tls = tls.ca_certificate(Certificate::from_pem(pem));
        }

        match (&config.cert_path, &config.key_path) {
            (Some(cert_path), Some(key_path)) => {
                let cert = std::fs::read(cert_path)
                    .with_context(|| format!("failed to read client cert: {cert_path}"))?;
                let key = std::fs::read(key_path)
                    .with_context(|| format!("failed to read client key: {key_path}"))?;
                tls = tls.identity(Identity::from_pem(cert, key));
            }
            _ => {}
        }

        if let Some(ref server_name) = config.server_name {
            tls = tls.domain_name(server_name.clone());
        }

        Ok(tls)
    }
}

/// Builds and caches one channel per replica endpoint.
pub struct ChannelManager {
    config: GrpcClientConfig,
    compression: Compression,
    tls_provider: Arc<dyn TlsProvider>,
    channels: RwLock<HashMap<String, Channel>>,
}

impl ChannelManager {
    /// Create a manager with the default file-based TLS provider.
    ///
    /// Fails fast on an unrecognized compression codec name, before any
    /// connection attempt.
    pub fn new(config: GrpcClientConfig) -> QuiverResult<Self> {
        Self::with_tls_provider(config, Arc::new(FileTlsProvider))
    }

    /// Create a manager with a custom TLS credential provider.
    pub fn with_tls_provider(
        config: GrpcClientConfig,
        tls_provider: Arc<dyn TlsProvider>,
    ) -> QuiverResult<Self> {
        let compression = config.compression()?;
        Ok(Self {
            config,
            compression,
            tls_provider,
            channels: RwLock::new(HashMap::new()),
        })
    }

    /// The resolved payload compression codec.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The client configuration this manager was built with.
    pub fn config(&self) -> &GrpcClientConfig {
        &self.config
    }

    /// Get the channel for an endpoint, building it on first use.
    pub fn channel(&self, endpoint: &str) -> QuiverResult<Channel> {
        if let Some(channel) = self.channels.read().get(endpoint) {
            return Ok(channel.clone());
        }

        let mut channels = self.channels.write();
        // Another caller may have built it while we waited for the lock.
        if let Some(channel) = channels.get(endpoint) {
            return Ok(channel.clone());
        }

        let channel = self.build_channel(endpoint)?;
        channels.insert(endpoint.to_string(), channel.clone());
        tracing::debug!(
            endpoint,
            codec = self.compression.as_str(),
            "created replica channel"
        );
        Ok(channel)
    }

    /// Number of cached channels.
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Drop all cached channels. Called once at process shutdown.
    pub fn shutdown(&self) {
        self.channels.write().clear();
    }

    fn build_channel(&self, endpoint: &str) -> QuiverResult<Channel> {
        let uri = if endpoint.contains("://") {
            endpoint.to_string()
        } else if self.config.tls_enabled {
            format!("https://{endpoint}")
        } else {
            format!("http://{endpoint}")
        };

        let mut builder = Endpoint::from_shared(uri)
            .map_err(|err| QuiverError::connection(endpoint, err))?
            .http2_keep_alive_interval(KEEPALIVE_INTERVAL)
            .keep_alive_timeout(KEEPALIVE_TIMEOUT)
            .keep_alive_while_idle(true);

        // A configured connect timeout overrides the transport's default
        // minimum connect timeout; 0 leaves the transport default in place.
        if let Some(timeout) = self.config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        if self.config.tls_enabled {
            let tls = self
                .tls_provider
                .credentials(&self.config.tls)
                .map_err(|err| QuiverError::connection(endpoint, err))?;
            builder = builder
                .tls_config(tls)
                .map_err(|err| QuiverError::connection(endpoint, err))?;
        }

        // Lazy connect: the dial happens on the first call, under that
        // call's deadline and retry policy.
        Ok(builder.connect_lazy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Channel construction needs a tokio runtime even when lazy.
    #[tokio::test]
    async fn channels_are_cached_per_endpoint() {
        let manager = ChannelManager::new(GrpcClientConfig::default()).expect("manager");
        manager.channel("replica-1:9095").expect("channel");
        manager.channel("replica-1:9095").expect("channel");
        manager.channel("replica-2:9095").expect("channel");
        assert_eq!(manager.channel_count(), 2);
    }

    #[tokio::test]
    async fn shutdown_clears_the_cache() {
        let manager = ChannelManager::new(GrpcClientConfig::default()).expect("manager");
        manager.channel("replica-1:9095").expect("channel");
        manager.shutdown();
        assert_eq!(manager.channel_count(), 0);
    }

    #[test]
    fn bad_codec_rejected_before_any_channel_exists() {
        let mut config = GrpcClientConfig::default();
        config.compression = "deflate9".to_string();
        let err = ChannelManager::new(config).err().expect("unsupported codec");
        assert!(matches!(err, QuiverError::UnsupportedCompression { .. }));
    }

    #[test]
    fn invalid_endpoint_is_a_connection_error() {
        let manager = ChannelManager::new(GrpcClientConfig::default()).expect("manager");
        let err = manager.channel("not a uri").unwrap_err();
        assert!(matches!(err, QuiverError::Connection { .. }));
    }

    #[test]
    fn missing_tls_material_fails_the_channel() {
        let mut config = GrpcClientConfig::default();
        config.tls_enabled = true;
        config.tls.ca_path = Some("/nonexistent/ca.pem".to_string());
        let manager = ChannelManager::new(config).expect("manager");
        let err = manager.channel("replica-1:9095").unwrap_err();
        assert!(matches!(err, QuiverError::Connection { .. }));
    }
}
