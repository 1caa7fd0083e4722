//! API constants

/// Prefix every item, payment and session route is nested under
pub const API_PREFIX: &str = "/api/v0";

/// Where the OpenAPI document is served
pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

/// Item images travel inline, so bodies may exceed the image limit by the
/// base64 overhead plus the other fields.
pub const BODY_LIMIT_OVERHEAD_BYTES: usize = 64 * 1024;

/// In-flight request cap when `HTTP_CONCURRENCY_LIMIT` is unset
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 512;
