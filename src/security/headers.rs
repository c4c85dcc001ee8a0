//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop and `Host` headers before forwarding upstream
//! - Build the client-facing header set from an upstream response
//!
//! # Design Decisions
//! - Upstream response headers pass through an explicit allow-list
//!   (`Content-Type`, `Content-Length`); everything else is dropped
//! - Two CORS headers are always added

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Response headers copied from upstream.
pub const FORWARDED_RESPONSE_HEADERS: [HeaderName; 2] = [header::CONTENT_TYPE, header::CONTENT_LENGTH];

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST";

/// Connection-level headers that must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "upgrade",
];

/// Request headers to send upstream.
///
/// `Host` is dropped so the client derives it from the rewritten URL.
/// `Transfer-Encoding` is dropped because the body is re-framed.
pub fn upstream_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    out.remove(header::HOST);
    out.remove(header::TRANSFER_ENCODING);
    for name in HOP_BY_HOP {
        out.remove(name);
    }
    out
}

/// Headers sent to the client for an upstream response.
pub fn client_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    out.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    out.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );

    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = upstream.get(&name) {
            out.insert(name, value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_allow_list() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        upstream.insert(header::SET_COOKIE, HeaderValue::from_static("a=b"));

        let out = client_response_headers(&upstream);
        assert_eq!(out.len(), 4);
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert_eq!(out[header::CONTENT_LENGTH], "12");
        assert_eq!(out[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(out[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
    }

    #[test]
    fn test_missing_upstream_headers_are_skipped() {
        let out = client_response_headers(&HeaderMap::new());
        assert_eq!(out.len(), 2);
        assert!(out.get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_request_headers_strip_host_and_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.old.com"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("proxy-connection", HeaderValue::from_static("keep-alive"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert("x-request-id", HeaderValue::from_static("abc"));

        let out = upstream_request_headers(&headers);
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("proxy-connection").is_none());
        assert_eq!(out[header::ACCEPT], "*/*");
        assert_eq!(out["x-request-id"], "abc");
    }
}
