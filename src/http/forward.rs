//! Request forwarding.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the upstream base (authority only)
//! - Copy method, path, query, headers and body unchanged
//! - Relay the upstream status, headers and body back to the caller
//!
//! # Design Decisions
//! - One inbound request maps to exactly one outbound call; no retries
//! - Both bodies are buffered, so an error can still be reported cleanly
//!   before any reply bytes exist
//! - The inbound `Host` is dropped; the client derives it from the upstream URL
//! - Hop-by-hop headers pass through unless stripping is enabled

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header::HOST, uri::PathAndQuery},
    response::{IntoResponse, Response},
};

use crate::config::ForwardingConfig;
use crate::http::error::GatewayError;
use crate::http::headers::strip_hop_by_hop;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::UpstreamTarget;

/// Catch-all handler: proxy whatever arrives to the upstream.
pub async fn forward_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let response = match forward(&state.upstream, &state.forwarding, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request("forward", method.as_str(), response.status().as_u16(), start_time);
    response
}

/// Forward one request and produce the reply to send back.
pub async fn forward(
    upstream: &UpstreamTarget,
    config: &ForwardingConfig,
    request: Request,
) -> Result<Response, GatewayError> {
    let outbound = build_outbound(upstream, config, request).await?;

    tracing::debug!(
        method = %outbound.method(),
        uri = %outbound.uri(),
        "Forwarding request"
    );

    let reply = upstream.send(outbound).await?;
    Ok(relay(reply, config))
}

/// Derive the outbound request from the inbound one.
pub async fn build_outbound(
    upstream: &UpstreamTarget,
    config: &ForwardingConfig,
    request: Request,
) -> Result<Request, GatewayError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    let uri = upstream
        .uri_for(path_and_query)
        .map_err(|e| GatewayError::InvalidOutboundRequest(e.to_string()))?;

    let body = axum::body::to_bytes(body, config.max_body_bytes)
        .await
        .map_err(|e| GatewayError::InboundBodyUnreadable(e.to_string()))?;

    let mut headers = parts.headers;
    headers.remove(HOST);
    if config.strip_hop_by_hop {
        strip_hop_by_hop(&mut headers);
    }
    upstream.authorize(&mut headers);

    // An empty body stays absent rather than becoming a zero-length payload.
    let body = if body.is_empty() {
        Body::empty()
    } else {
        Body::from(body)
    };

    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = headers;
    Ok(outbound)
}

/// Turn the fully read upstream reply into the caller's reply.
fn relay(reply: axum::http::Response<Bytes>, config: &ForwardingConfig) -> Response {
    let (mut parts, body) = reply.into_parts();
    if config.strip_hop_by_hop {
        strip_hop_by_hop(&mut parts.headers);
    }

    tracing::debug!(status = %parts.status, bytes = body.len(), "Relaying upstream response");
    Response::from_parts(parts, Body::from(body))
}
