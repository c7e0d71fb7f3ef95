use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const X_XSS_PROTECTION: &str = "x-xss-protection";
    pub const STRICT_TRANSPORT_SECURITY: &str = "strict-transport-security";
}

/// Adds standard hardening headers to every response. HSTS is only
/// emitted when explicitly enabled, since it breaks plain-HTTP setups.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let h = response.headers_mut();

    h.insert(
        headers::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    h.insert(headers::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    h.insert(
        headers::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );

    if hsts_enabled() {
        h.insert(
            headers::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    response
}

fn hsts_enabled() -> bool {
    std::env::var("IP__SECURITY__HSTS_ENABLED")
        .map(|v| v == "true")
        .unwrap_or(false)
}
