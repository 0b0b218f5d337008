//! Upstream API server access.
//!
//! Exactly one [`UpstreamTarget`] exists per process. It is built at startup
//! from configuration (or the in-cluster environment) and shared read-only by
//! the forwarder and the OpenAPI document source.

pub mod target;
pub mod tls;

pub use target::{UpstreamCallError, UpstreamClient, UpstreamError, UpstreamTarget};
