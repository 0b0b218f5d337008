//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace span with request ID)
//!     → document path?  → openapi::handler
//!     → docs page?      → openapi::handler
//!     → anything else   → forward.rs (rebuild against upstream, relay reply)
//!     → error.rs        (any failure → 500 {"error": ...})
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod headers;
pub mod server;

pub use error::GatewayError;
pub use server::{AppState, HttpServer};
