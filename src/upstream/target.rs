//! The configured upstream: one origin and one client, built once.
//!
//! Outbound requests are addressed as `scheme://authority` of the base plus
//! the caller's path and query, spliced in as an opaque `PathAndQuery`, so
//! the target reaches the upstream exactly as it was received. The client
//! follows no redirects, consults no proxy and adds no headers beyond `Host`
//! and the framing hyper requires.

use std::fmt;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use url::Url;

use crate::config::validation::check_base_url;
use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::upstream::tls;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Pooled HTTP/1.1 client speaking plain HTTP or TLS depending on the scheme.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Errors building the upstream target.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no upstream configured and not running inside a cluster")]
    NotConfigured,

    #[error("invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to read {path}: {source}")]
    Credential {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bearer token is not a valid header value")]
    InvalidToken,

    #[error("invalid CA certificate {path}: {message}")]
    Certificate { path: String, message: String },

    #[error("failed to configure TLS: {0}")]
    Tls(#[source] rustls::Error),
}

/// Failure of a single exchange with the upstream.
#[derive(Debug, Error)]
pub enum UpstreamCallError {
    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error(transparent)]
    Send(#[from] hyper_util::client::legacy::Error),

    #[error("no complete response within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),
}

/// Immutable upstream target shared by every handler.
///
/// The hyper client is reference counted internally, so clones share one
/// connection pool.
#[derive(Clone)]
pub struct UpstreamTarget {
    base: Url,
    scheme: Scheme,
    authority: Authority,
    client: UpstreamClient,
    authorization: Option<HeaderValue>,
    request_timeout: Duration,
}

impl fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("base", &self.base.as_str())
            .field("authorization", &self.authorization.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl UpstreamTarget {
    /// Build the target from configuration, falling back to in-cluster discovery.
    pub fn from_config(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, UpstreamError> {
        let resolved = if upstream.base_url.is_empty() {
            in_cluster(|key| std::env::var(key).ok()).ok_or(UpstreamError::NotConfigured)?
        } else {
            upstream.clone()
        };

        let base = check_base_url(&resolved.base_url).map_err(UpstreamError::InvalidBaseUrl)?;
        let (scheme, authority) = origin_parts(&base)?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls::client_config(&resolved)?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let authorization = bearer_token(&resolved)?
            .map(|token| authorization_header(&token))
            .transpose()?;

        tracing::info!(
            base = %base,
            timeout_secs = timeouts.request_secs,
            bearer_token = authorization.is_some(),
            "Upstream target ready"
        );

        Ok(Self {
            base,
            scheme,
            authority,
            client,
            authorization,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute upstream URI for an origin-form `path[?query]`, kept verbatim.
    pub fn uri_for(&self, path_and_query: PathAndQuery) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Add the configured bearer token unless the caller brought its own.
    pub fn authorize(&self, headers: &mut HeaderMap) {
        if let Some(value) = &self.authorization {
            if !headers.contains_key(AUTHORIZATION) {
                headers.insert(AUTHORIZATION, value.clone());
            }
        }
    }

    /// Whether `url` shares the upstream's scheme, host and port.
    pub fn is_own_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }

    /// Perform one exchange and read the reply in full.
    ///
    /// The timeout budget covers connecting, waiting for the head and
    /// reading the body.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Bytes>, UpstreamCallError> {
        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(UpstreamCallError::Body)?;
            Ok::<_, UpstreamCallError>(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| UpstreamCallError::Timeout(self.request_timeout))?
    }

    /// Issue an authorized GET against an upstream path.
    pub async fn get(&self, path: &str) -> Result<Response<Bytes>, UpstreamCallError> {
        let path = PathAndQuery::try_from(path).map_err(axum::http::Error::from)?;
        let mut request = Request::get(self.uri_for(path)?).body(Body::empty())?;
        self.authorize(request.headers_mut());
        self.send(request).await
    }

    /// Issue a GET against an absolute URL.
    ///
    /// The bearer token is only attached when the URL points at the
    /// upstream's own origin.
    pub async fn get_url(&self, url: &Url) -> Result<Response<Bytes>, UpstreamCallError> {
        let uri = Uri::try_from(url.as_str()).map_err(axum::http::Error::from)?;
        let mut request = Request::get(uri).body(Body::empty())?;
        if self.is_own_origin(url) {
            self.authorize(request.headers_mut());
        }
        self.send(request).await
    }
}

fn origin_parts(base: &Url) -> Result<(Scheme, Authority), UpstreamError> {
    let invalid = |e: &dyn fmt::Display| UpstreamError::InvalidBaseUrl(format!("'{base}': {e}"));

    let scheme = Scheme::from_str(base.scheme()).map_err(|e| invalid(&e))?;
    let host = base.host_str().ok_or_else(|| invalid(&"missing host"))?;
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let authority = Authority::from_str(&authority).map_err(|e| invalid(&e))?;
    Ok((scheme, authority))
}

fn authorization_header(token: &str) -> Result<HeaderValue, UpstreamError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        .map_err(|_| UpstreamError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer_token(config: &UpstreamConfig) -> Result<Option<String>, UpstreamError> {
    if let Some(token) = &config.bearer_token {
        return Ok(Some(token.clone()));
    }
    match &config.bearer_token_file {
        Some(path) => fs::read_to_string(path)
            .map(Some)
            .map_err(|source| UpstreamError::Credential {
                path: path.clone(),
                source,
            }),
        None => Ok(None),
    }
}

/// In-cluster upstream settings derived from the service environment.
fn in_cluster(lookup: impl Fn(&str) -> Option<String>) -> Option<UpstreamConfig> {
    let host = lookup("KUBERNETES_SERVICE_HOST")?;
    let port = lookup("KUBERNETES_SERVICE_PORT")?;
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host
    };

    tracing::info!(host = %host, port = %port, "Using in-cluster upstream");

    Some(UpstreamConfig {
        base_url: format!("https://{host}:{port}"),
        bearer_token: None,
        bearer_token_file: Some(format!("{SERVICE_ACCOUNT_DIR}/token")),
        ca_cert_path: Some(format!("{SERVICE_ACCOUNT_DIR}/ca.crt")),
        insecure_skip_tls_verify: false,
    })
}
