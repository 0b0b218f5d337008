//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream API server every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout budget for outbound calls.
    pub timeouts: TimeoutConfig,

    /// Forwarding behavior.
    pub forwarding: ForwardingConfig,

    /// OpenAPI document serving.
    pub openapi: OpenApiConfig,

    /// Documentation UI page.
    pub docs: DocsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream connection settings.
///
/// An empty `base_url` means "discover from the in-cluster environment".
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme + host[:port] of the upstream (e.g., "https://10.0.0.1:6443").
    pub base_url: String,

    /// Static bearer token sent to the upstream origin when the caller
    /// supplies no `Authorization`.
    pub bearer_token: Option<String>,

    /// File holding a bearer token (read once at startup).
    pub bearer_token_file: Option<String>,

    /// PEM CA bundle to trust instead of the system roots.
    pub ca_cert_path: Option<String>,

    /// Skip upstream certificate verification.
    pub insecure_skip_tls_verify: bool,
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for an outbound request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Remove hop-by-hop headers on both legs. Off means full pass-through.
    pub strip_hop_by_hop: bool,

    /// Maximum inbound body size buffered before forwarding.
    pub max_body_bytes: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_hop_by_hop: false,
            max_body_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// How the OpenAPI document is obtained.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpenApiMode {
    /// Fetch from the upstream on every request.
    #[default]
    OnDemand,
    /// Fetch once before serving; hold the bytes for the process lifetime.
    Startup,
}

/// OpenAPI document configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenApiConfig {
    pub mode: OpenApiMode,

    /// Inbound path serving the document. Defaults depend on `mode`.
    pub serve_path: Option<String>,

    /// Upstream path of its own OpenAPI v2 description.
    pub discovery_path: String,

    /// Absolute URL for the startup fetch (defaults to upstream + discovery path).
    pub source_url: Option<String>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            mode: OpenApiMode::OnDemand,
            serve_path: None,
            discovery_path: "/openapi/v2".to_string(),
            source_url: None,
        }
    }
}

impl OpenApiConfig {
    /// The inbound path the document is served on.
    pub fn serve_path(&self) -> &str {
        match (&self.serve_path, self.mode) {
            (Some(path), _) => path,
            (None, OpenApiMode::OnDemand) => "/swagger.json",
            (None, OpenApiMode::Startup) => "/swagger",
        }
    }
}

/// Documentation UI configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/docs".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
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
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
