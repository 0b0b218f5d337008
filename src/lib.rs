//! Kubernetes API gateway library.
//!
//! Forwards every inbound request verbatim to one upstream API server and
//! serves that upstream's OpenAPI v2 description for documentation tooling.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod openapi;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
