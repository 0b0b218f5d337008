//! Errors surfaced to callers by the gateway.
//!
//! Every variant renders as `500 Internal Server Error` with a JSON body of
//! the form `{"error": "<message>"}`. The response is built only after the
//! failure is known, so no partial upstream bytes ever precede it.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::observability::metrics;
use crate::openapi::DocumentError;
use crate::upstream::UpstreamCallError;

/// Per-request failure of the forwarder or the document handler.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, TLS or send failure on the outbound call.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] hyper_util::client::legacy::Error),

    /// The exchange exceeded the configured timeout budget.
    #[error("upstream timed out after {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// A response arrived but its body could not be read in full.
    #[error("failed to read upstream response body: {0}")]
    UpstreamBodyUnreadable(#[source] axum::Error),

    #[error("failed to read request body: {0}")]
    InboundBodyUnreadable(String),

    #[error("invalid outbound request: {0}")]
    InvalidOutboundRequest(String),

    #[error("malformed OpenAPI document: {0}")]
    MalformedDocument(#[from] DocumentError),

    #[error("upstream answered {0} for the OpenAPI document")]
    DocumentStatus(StatusCode),
}

impl GatewayError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::UpstreamBodyUnreadable(_) => "upstream_body_unreadable",
            Self::InboundBodyUnreadable(_) => "inbound_body_unreadable",
            Self::InvalidOutboundRequest(_) => "invalid_outbound_request",
            Self::MalformedDocument(_) => "malformed_document",
            Self::DocumentStatus(_) => "document_status",
        }
    }
}

impl From<UpstreamCallError> for GatewayError {
    fn from(err: UpstreamCallError) -> Self {
        match err {
            UpstreamCallError::Request(e) => Self::InvalidOutboundRequest(e.to_string()),
            UpstreamCallError::Send(e) => Self::UpstreamUnreachable(e),
            UpstreamCallError::Timeout(budget) => Self::UpstreamTimeout(budget),
            UpstreamCallError::Body(e) => Self::UpstreamBodyUnreadable(e),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!(kind = self.kind(), error = %self, "Request failed");
        metrics::record_upstream_error(self.kind());

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn renders_json_500() {
        let err = GatewayError::InboundBodyUnreadable("length limit exceeded".into());
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "error": "failed to read request body: length limit exceeded" })
        );
    }

    #[test]
    fn timeout_names_the_budget() {
        let err = GatewayError::from(UpstreamCallError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.kind(), "upstream_timeout");
        assert_eq!(err.to_string(), "upstream timed out after 30s");
    }

    #[test]
    fn document_status_message() {
        let err = GatewayError::DocumentStatus(StatusCode::FORBIDDEN);
        assert_eq!(err.kind(), "document_status");
        assert_eq!(
            err.to_string(),
            "upstream answered 403 Forbidden for the OpenAPI document"
        );
    }
}
