//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing with per-request IDs)
//! - Bind server to listener
//! - Dispatch the document path, the docs page and everything else (forwarder)

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::Request,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{DocsConfig, ForwardingConfig, GatewayConfig};
use crate::http::forward::forward_handler;
use crate::openapi::docs::render_docs_page;
use crate::openapi::handler::{docs_handler, openapi_handler};
use crate::openapi::DocumentSource;
use crate::upstream::UpstreamTarget;

/// Application state injected into handlers.
///
/// Everything here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamTarget,
    pub forwarding: Arc<ForwardingConfig>,
    pub documents: DocumentSource,
    pub docs_page: Bytes,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Compose the server from a ready upstream and document source.
    pub fn new(config: &GatewayConfig, upstream: UpstreamTarget, documents: DocumentSource) -> Self {
        let serve_path = config.openapi.serve_path();
        let state = AppState {
            upstream,
            forwarding: Arc::new(config.forwarding.clone()),
            documents,
            docs_page: render_docs_page(serve_path),
        };

        let router = Self::build_router(serve_path, &config.docs, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(serve_path: &str, docs: &DocsConfig, state: AppState) -> Router {
        // Non-GET methods on the fixed paths still reach the upstream.
        let mut router = Router::new()
            .route(serve_path, get(openapi_handler).fallback(forward_handler))
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler));

        if docs.enabled {
            router = router.route(&docs.path, get(docs_handler).fallback(forward_handler));
        }

        router
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
    }

    /// The composed router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
