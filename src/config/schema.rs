//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files; every section has defaults so a minimal file is enough.

use serde::{Deserialize, Serialize};

use crate::augment::AugmentMode;
use crate::resilience::RetryPolicy;

/// Root configuration for the batch gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, limits, TLS).
    pub listener: ListenerConfig,

    /// Shared upstream channel settings.
    pub upstream: UpstreamConfig,

    /// Batch dispatch engine settings.
    pub dispatch: DispatchConfig,

    /// Access-key authentication for the batch endpoint.
    pub auth: AuthConfig,

    /// Optional header-routed relay mode.
    pub relay: RelayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Whole-request timeout in seconds. Must comfortably exceed the
    /// worst-case batch duration; a batch runs every item to completion.
    pub request_timeout_secs: u64,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_secs: 300,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// User-Agent sent on forwarded sub-requests unless overridden.
    pub user_agent: String,

    /// Keep-alive idle timeout in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle keep-alive sockets per upstream host, independent of
    /// dispatch concurrency.
    pub pool_max_idle_per_host: usize,

    /// Optional forwarding relay all traffic is tunneled through.
    pub relay_proxy: Option<RelayProxyConfig>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("fanout-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            pool_idle_timeout_secs: 60,
            pool_max_idle_per_host: 32,
            relay_proxy: None,
        }
    }
}

/// Forwarding relay (CONNECT proxy) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayProxyConfig {
    /// Relay URI (e.g., "http://relay.internal:3128").
    pub uri: String,

    /// Verbatim Proxy-Authorization value, supplied out-of-band.
    pub authorization: Option<String>,
}

/// Batch dispatch engine configuration. Supplied once per batch
/// invocation; never mutated during dispatch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum sub-requests in flight at once.
    pub max_concurrency: usize,

    /// Per-item deadline in milliseconds.
    pub per_item_timeout_ms: u64,

    /// Cap on a buffered upstream response body, in bytes.
    pub max_response_bytes: usize,

    /// Retry policy applied around the executor.
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            per_item_timeout_ms: 10_000,
            max_response_bytes: 2 * 1024 * 1024,
            retry: RetryPolicy::default(),
        }
    }
}

/// Access-key authentication for the batch endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer access key callers must present.
    pub access_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            access_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Header-routed relay mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Enable the relay front-end.
    pub enabled: bool,

    /// Header naming the relay target host.
    pub host_header: String,

    /// Scheme used toward the relay target ("http" or "https").
    pub scheme: String,

    /// Hosts the relay may forward to.
    pub allowed_hosts: Vec<String>,

    /// Body augmentation strategy for relayed responses.
    pub augment: AugmentMode,

    /// Replace the outer status with 200; the embedded envelope keeps the
    /// true upstream status.
    pub override_status: bool,

    /// Cap on buffered relay bodies (request and response), in bytes.
    pub max_body_bytes: usize,

    /// Relay forwarding deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host_header: "x-relay-host".to_string(),
            scheme: "https".to_string(),
            allowed_hosts: Vec::new(),
            augment: AugmentMode::default(),
            override_status: false,
            max_body_bytes: 2 * 1024 * 1024,
            timeout_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
