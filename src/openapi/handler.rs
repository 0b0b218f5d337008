//! Handlers for the document path and the documentation page.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::observability::metrics;

/// Serve the OpenAPI document.
pub async fn openapi_handler(State(state): State<AppState>) -> Response {
    let start_time = Instant::now();

    let response = match state.documents.serve().await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request("openapi", "GET", response.status().as_u16(), start_time);
    response
}

/// Serve the documentation UI page.
pub async fn docs_handler(State(state): State<AppState>) -> Html<Bytes> {
    Html(state.docs_page.clone())
}
