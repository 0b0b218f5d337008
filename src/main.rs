//! Kubernetes API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  GATEWAY                     │
//!     Client Request      │  ┌─────────┐    ┌──────────────────────┐     │
//!     ────────────────────┼─▶│  http   │───▶│ /swagger(.json)      │─────┼──┐
//!                         │  │ server  │    │   openapi source     │     │  │
//!                         │  └────┬────┘    └──────────────────────┘     │  │
//!                         │       │  any other path                      │  │
//!                         │       ▼                                      │  ▼
//!     Client Response     │  ┌─────────┐    ┌──────────────────────┐     │ Upstream
//!     ◀───────────────────┼──│ forward │◀──▶│ upstream target      │◀────┼─▶ API
//!                         │  └─────────┘    │ (one pooled client)  │     │ server
//!                         │                 └──────────────────────┘     │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use kube_gateway::config::{loader, GatewayConfig, LogFormat};
use kube_gateway::lifecycle::{self, Shutdown};
use kube_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "kube-gateway", version)]
#[command(about = "Reverse-proxying gateway with an aggregated OpenAPI view", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream base URL, overriding the file.
    #[arg(long, env = "GATEWAY_UPSTREAM")]
    upstream: Option<String>,

    /// Listen address, overriding the file.
    #[arg(long, env = "GATEWAY_BIND")]
    bind: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn into_config(self) -> Result<GatewayConfig, loader::ConfigError> {
        let mut config = match &self.config {
            Some(path) => loader::read_config(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(upstream) = self.upstream {
            config.upstream.base_url = upstream;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }

        loader::validate(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level, config.observability.log_format)?;

    tracing::info!("kube-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        openapi_mode = ?config.openapi.mode,
        strip_hop_by_hop = config.forwarding.strip_hop_by_hop,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already validated.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr).map_err(lifecycle::StartupError::from)?;
    }

    let server = lifecycle::compose(&config).await?;
    let listener = lifecycle::bind(&config).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
