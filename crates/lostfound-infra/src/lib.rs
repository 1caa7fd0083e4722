//! Lost & Found Infrastructure Library
//!
//! Shared plumbing for the service binaries:
//! - Middleware (request ID, security headers)
//! - Tracing subscriber initialization

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "middleware")]
pub use middleware::{
    request_id_middleware, security_headers_middleware, RequestId, REQUEST_ID_HEADER,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};
