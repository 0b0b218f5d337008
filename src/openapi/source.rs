//! Where the served document comes from.
//!
//! Two deployment variants:
//! - `OnDemand`: every request re-fetches the upstream discovery path,
//!   validates it and re-serializes the parsed document.
//! - `Cached`: the document is fetched and validated once before serving
//!   starts; requests get the held bytes back verbatim. The value is built
//!   at composition time and shared read-only through the router state.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use url::Url;

use crate::http::error::GatewayError;
use crate::openapi::document::OpenApiDocument;
use crate::upstream::UpstreamTarget;

/// Fatal failure of the startup fetch.
#[derive(Debug, Error)]
#[error("failed to fetch OpenAPI document from {url}: {source}")]
pub struct StartupFetchError {
    pub url: String,
    #[source]
    pub source: GatewayError,
}

/// A validated document held for the process lifetime.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    bytes: Bytes,
}

impl CachedDocument {
    /// Fetch and validate the document once; any failure is fatal to startup.
    ///
    /// Credentials only go out when `url` is on the upstream's own origin.
    pub async fn fetch(upstream: &UpstreamTarget, url: &Url) -> Result<Self, StartupFetchError> {
        let location = url.to_string();
        tracing::info!(url = %location, "Fetching OpenAPI document");

        let fetched = match upstream.get_url(url).await {
            Ok(response) => read_document(response),
            Err(e) => Err(e.into()),
        };
        let bytes = fetched
            .and_then(|bytes| {
                OpenApiDocument::from_slice(&bytes)?;
                Ok(bytes)
            })
            .map_err(|source| StartupFetchError {
                url: location.clone(),
                source,
            })?;

        tracing::info!(url = %location, bytes = bytes.len(), "OpenAPI document cached");
        Ok(Self { bytes })
    }

    /// Hold already-validated bytes.
    pub fn from_bytes(bytes: Bytes) -> Result<Self, GatewayError> {
        OpenApiDocument::from_slice(&bytes)?;
        Ok(Self { bytes })
    }
}

/// Strategy for producing the document on each request.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    OnDemand {
        upstream: UpstreamTarget,
        discovery_path: String,
    },
    Cached(CachedDocument),
}

impl DocumentSource {
    pub fn on_demand(upstream: UpstreamTarget, discovery_path: impl Into<String>) -> Self {
        Self::OnDemand {
            upstream,
            discovery_path: discovery_path.into(),
        }
    }

    /// Produce the reply for one request on the document path.
    pub async fn serve(&self) -> Result<Response, GatewayError> {
        match self {
            Self::OnDemand {
                upstream,
                discovery_path,
            } => {
                let bytes = read_document(upstream.get(discovery_path).await?)?;
                let document = OpenApiDocument::from_slice(&bytes)?;
                Ok((StatusCode::OK, Json(document)).into_response())
            }
            Self::Cached(cached) => {
                let mut response = Response::new(Body::from(cached.bytes.clone()));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Ok(response)
            }
        }
    }
}

/// Body of a discovery response, treating non-2xx as failure.
fn read_document(response: Response<Bytes>) -> Result<Bytes, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::DocumentStatus(status));
    }
    Ok(response.into_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    const DOC: &[u8] = br#"{"swagger":"2.0","info":{"title":"T","version":"v1"},"paths":{"/x":{}}}"#;

    #[tokio::test]
    async fn cached_document_is_served_verbatim() {
        let source = DocumentSource::Cached(CachedDocument::from_bytes(Bytes::from_static(DOC)).unwrap());

        let response = source.serve().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], DOC);
    }

    #[test]
    fn cached_document_must_validate() {
        let err = CachedDocument::from_bytes(Bytes::from_static(b"<html>")).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedDocument(_)));
    }
}
