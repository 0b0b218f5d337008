//! OpenAPI document aggregation.
//!
//! # Data Flow
//! ```text
//! GET <serve path>
//!     → handler.rs
//!     → source.rs (on-demand fetch of the discovery path, or cached bytes)
//!     → document.rs (structural validation)
//!     → 200 application/json | 500 {"error": ...}
//! ```

pub mod docs;
pub mod document;
pub mod handler;
pub mod source;

pub use document::{DocumentError, Info, OpenApiDocument};
pub use source::{CachedDocument, DocumentSource, StartupFetchError};
