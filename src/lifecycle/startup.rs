//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the upstream target from validated configuration
//! - In startup mode, fetch and validate the OpenAPI document
//! - Compose the server and bind its listener
//!
//! Any error here is fatal: the process exits before serving traffic.

use std::io;

use thiserror::Error;
use tokio::net::TcpListener;
use url::Url;

use crate::config::{ConfigError, GatewayConfig, OpenApiMode};
use crate::http::HttpServer;
use crate::openapi::{CachedDocument, DocumentSource, StartupFetchError};
use crate::upstream::{UpstreamError, UpstreamTarget};

/// Reasons the gateway cannot start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("invalid OpenAPI source URL: {0}")]
    SourceUrl(String),

    #[error(transparent)]
    Document(#[from] StartupFetchError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Build the upstream target and document source, then compose the server.
pub async fn compose(config: &GatewayConfig) -> Result<HttpServer, StartupError> {
    let upstream = UpstreamTarget::from_config(&config.upstream, &config.timeouts)?;

    let documents = match config.openapi.mode {
        OpenApiMode::OnDemand => {
            DocumentSource::on_demand(upstream.clone(), config.openapi.discovery_path.clone())
        }
        OpenApiMode::Startup => {
            let url = document_url(config, &upstream)?;
            DocumentSource::Cached(CachedDocument::fetch(&upstream, &url).await?)
        }
    };

    tracing::info!(
        mode = ?config.openapi.mode,
        serve_path = config.openapi.serve_path(),
        "OpenAPI document source ready"
    );

    Ok(HttpServer::new(config, upstream, documents))
}

/// Bind the configured listener address.
pub async fn bind(config: &GatewayConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!(address = %local, "Listening for connections");
    }
    Ok(listener)
}

fn document_url(config: &GatewayConfig, upstream: &UpstreamTarget) -> Result<Url, StartupError> {
    match &config.openapi.source_url {
        Some(raw) => Url::parse(raw).map_err(|e| StartupError::SourceUrl(format!("'{raw}': {e}"))),
        None => upstream
            .base()
            .join(&config.openapi.discovery_path)
            .map_err(|e| StartupError::SourceUrl(e.to_string())),
    }
}
