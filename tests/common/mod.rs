//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Bytes},
    extract::Request,
    http::{HeaderMap, Method},
    response::Response,
    Router,
};
use kube_gateway::config::GatewayConfig;
use kube_gateway::lifecycle::{self, Shutdown, StartupError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Origin-form target exactly as received: path and query.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A mock upstream that records every request it answers.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.uri == path)
            .count()
    }
}

/// Start a mock upstream on an ephemeral port.
///
/// `respond` builds the reply for each recorded request.
pub async fn start_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&Recorded) -> Response + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let store = requests.clone();
    let app = Router::new().fallback(move |request: Request| {
        let store = store.clone();
        let respond = respond.clone();
        async move {
            let (parts, body) = request.into_parts();
            let recorded = Recorded {
                method: parts.method,
                uri: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body: to_bytes(body, usize::MAX).await.unwrap(),
            };
            let response = respond(&recorded);
            store.lock().unwrap().push(recorded);
            response
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, requests }
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A gateway running in the background.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Compose and serve a gateway for `config` on an ephemeral port.
pub async fn start_gateway(mut config: GatewayConfig) -> Result<Gateway, StartupError> {
    config.listener.bind_address = "127.0.0.1:0".into();

    let server = lifecycle::compose(&config).await?;
    let listener = lifecycle::bind(&config).await?;
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Ok(Gateway { addr, shutdown })
}

/// Gateway config pointing at `upstream_base`.
pub fn config_for(upstream_base: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = upstream_base.to_string();
    config
}

/// Write a raw HTTP/1.1 request and read until the server closes.
///
/// Used where an HTTP client library would normalize the request target or
/// add headers of its own.
pub async fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    String::from_utf8_lossy(&reply).into_owned()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
