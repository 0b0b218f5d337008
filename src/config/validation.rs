//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting inbound paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if !config.upstream.base_url.is_empty() {
        if let Err(message) = check_base_url(&config.upstream.base_url) {
            errors.push(ValidationError::new("upstream.base_url", message));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.forwarding.max_body_bytes == 0 {
        errors.push(ValidationError::new("forwarding.max_body_bytes", "must be greater than 0"));
    }

    let serve_path = config.openapi.serve_path();
    for (field, path) in [
        ("openapi.serve_path", serve_path),
        ("openapi.discovery_path", config.openapi.discovery_path.as_str()),
        ("docs.path", config.docs.path.as_str()),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, format!("'{path}' must start with '/'")));
        }
    }

    // Served paths become fixed routes next to the catch-all.
    for (field, path) in [("openapi.serve_path", serve_path), ("docs.path", config.docs.path.as_str())] {
        if path == "/" || path.contains(['{', '}', '*']) {
            errors.push(ValidationError::new(
                field,
                format!("'{path}' must be a fixed path other than '/'"),
            ));
        }
    }

    if config.docs.enabled && config.docs.path == serve_path {
        errors.push(ValidationError::new(
            "docs.path",
            format!("'{}' collides with openapi.serve_path", config.docs.path),
        ));
    }

    if let Some(source) = &config.openapi.source_url {
        if let Err(e) = Url::parse(source) {
            errors.push(ValidationError::new("openapi.source_url", e.to_string()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The upstream base must be an authority only: http(s), a host, nothing after it.
pub(crate) fn check_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}': {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("'{raw}' has no host"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(format!("'{raw}' must not carry a path, query or fragment"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.upstream.base_url = "https://api.example:6443/prefix".into();
        config.docs.path = "/swagger.json".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "upstream.base_url",
                "timeouts.request_secs",
                "docs.path"
            ]
        );
    }

    #[test]
    fn base_url_rules() {
        assert!(check_base_url("https://10.0.0.1:6443").is_ok());
        assert!(check_base_url("http://localhost:8001/").is_ok());
        assert!(check_base_url("ftp://host").is_err());
        assert!(check_base_url("https://host/api").is_err());
        assert!(check_base_url("https://host?x=1").is_err());
        assert!(check_base_url("not a url").is_err());
    }

    #[test]
    fn relative_paths_rejected() {
        let mut config = GatewayConfig::default();
        config.openapi.discovery_path = "openapi/v2".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "openapi.discovery_path");
    }

    #[test]
    fn served_paths_must_be_fixed() {
        let mut config = GatewayConfig::default();
        config.openapi.serve_path = Some("/".into());
        config.docs.path = "/docs/{*rest}".into();
        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["openapi.serve_path", "docs.path"]);
    }
}
