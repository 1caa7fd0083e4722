use axum::http::{HeaderName, HeaderValue};
use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::LazyLock;

const BASELINE: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    // Item photos are stored inline as data URIs.
    (
        "content-security-policy",
        "default-src 'none'; img-src 'self' data:; frame-ancestors 'none'",
    ),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
];

const HSTS: &str = "max-age=31536000; includeSubDomains";

static BEHIND_TLS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("ENVIRONMENT")
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
});

/// Adds browser hardening headers to every response. Guest addresses and
/// phone numbers travel in these bodies, so nothing may frame or sniff them.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in BASELINE {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if *BEHIND_TLS {
        headers.insert(
            axum::http::header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }

    response
}
