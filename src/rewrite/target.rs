//! Request target decomposition.
//!
//! A forward proxy normally receives absolute-form targets
//! (`GET http://host:port/path?q HTTP/1.1`). Origin-form targets
//! (`GET /path?q`) are resolved against the `Host` header with an `http` scheme.

use std::fmt;
use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, Uri};
use thiserror::Error;

/// Errors raised while decomposing a request target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("request target has no host and no Host header")]
    MissingHost,

    #[error("invalid host `{0}`")]
    InvalidHost(String),

    #[error("invalid port in `{0}`")]
    InvalidPort(String),
}

/// The parts of a request target the rewriters operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget {
    scheme: String,
    host: String,
    port: Option<u16>,
    path_and_query: String,
}

impl RewriteTarget {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
        path_and_query: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            path_and_query: path_and_query.into(),
        }
    }

    /// Decompose an inbound request URI, falling back to the `Host` header.
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Result<Self, TargetError> {
        let scheme = uri.scheme_str().unwrap_or("http").to_ascii_lowercase();

        let authority = match uri.authority() {
            Some(authority) => authority.clone(),
            None => {
                let host = headers
                    .get(header::HOST)
                    .ok_or(TargetError::MissingHost)?
                    .to_str()
                    .map_err(|_| TargetError::InvalidHost("<non-ascii>".to_string()))?;
                Authority::from_str(host).map_err(|_| TargetError::InvalidHost(host.to_string()))?
            }
        };

        let host = authority.host();
        if host.is_empty() {
            return Err(TargetError::InvalidHost(authority.to_string()));
        }

        // `Authority` accepts any digits after the colon; `port_u16` is None when they overflow.
        let port = match authority.port_u16() {
            Some(port) => Some(port),
            None if port_text(authority.as_str()).is_some() => {
                return Err(TargetError::InvalidPort(authority.to_string()));
            }
            None => None,
        };

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/");

        Ok(Self::new(scheme, host, port, path_and_query))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port given explicitly in the request, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Explicit port, else 80 for `http` and 443 for anything else.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| default_port(&self.scheme))
    }

    /// The target as a full URL, keeping the port only when it was explicit.
    pub fn full_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.scheme, self.host, port, self.path_and_query),
            None => format!("{}://{}{}", self.scheme, self.host, self.path_and_query),
        }
    }
}

impl fmt::Display for RewriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_url())
    }
}

/// Non-empty text after the port colon, skipping userinfo and IPv6 brackets.
fn port_text(authority: &str) -> Option<&str> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let tail = host_port.rsplit_once(']').map_or(host_port, |(_, tail)| tail);
    tail.rsplit_once(':')
        .map(|(_, port)| port)
        .filter(|port| !port.is_empty())
}

/// Default port for a scheme.
pub fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("http") {
        80
    } else {
        443
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn host_headers(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn test_absolute_form() {
        let uri: Uri = "http://api.old.com:8080/old/42?x=1".parse().unwrap();
        let target = RewriteTarget::from_request(&uri, &HeaderMap::new()).unwrap();

        assert_eq!(target.scheme(), "http");
        assert_eq!(target.host(), "api.old.com");
        assert_eq!(target.port(), Some(8080));
        assert_eq!(target.path_and_query(), "/old/42?x=1");
        assert_eq!(target.full_url(), "http://api.old.com:8080/old/42?x=1");
    }

    #[test]
    fn test_absolute_form_ignores_host_header() {
        let uri: Uri = "https://a.example/x".parse().unwrap();
        let target = RewriteTarget::from_request(&uri, &host_headers("b.example")).unwrap();
        assert_eq!(target.host(), "a.example");
        assert_eq!(target.effective_port(), 443);
    }

    #[test]
    fn test_origin_form_uses_host_header() {
        let uri: Uri = "/old/42?x=1".parse().unwrap();
        let target = RewriteTarget::from_request(&uri, &host_headers("api.old.com")).unwrap();

        assert_eq!(target.scheme(), "http");
        assert_eq!(target.host(), "api.old.com");
        assert_eq!(target.port(), None);
        assert_eq!(target.effective_port(), 80);
        assert_eq!(target.full_url(), "http://api.old.com/old/42?x=1");
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        let uri: Uri = "http://example.com".parse().unwrap();
        let target = RewriteTarget::from_request(&uri, &HeaderMap::new()).unwrap();
        assert_eq!(target.path_and_query(), "/");
    }

    #[test]
    fn test_missing_host_fails() {
        let uri: Uri = "/path".parse().unwrap();
        assert_eq!(
            RewriteTarget::from_request(&uri, &HeaderMap::new()),
            Err(TargetError::MissingHost)
        );
    }

    #[test]
    fn test_out_of_range_port_fails() {
        let uri: Uri = "/path".parse().unwrap();
        let err = RewriteTarget::from_request(&uri, &host_headers("example.com:99999")).unwrap_err();
        assert!(matches!(err, TargetError::InvalidPort(_) | TargetError::InvalidHost(_)));
    }

    #[test]
    fn test_port_text() {
        assert_eq!(port_text("example.com:8080"), Some("8080"));
        assert_eq!(port_text("example.com"), None);
        assert_eq!(port_text("[::1]"), None);
        assert_eq!(port_text("[::1]:99999"), Some("99999"));
        assert_eq!(port_text("user:pw@example.com"), None);
    }

    #[test]
    fn test_default_port() {
        assert_eq!(default_port("http"), 80);
        assert_eq!(default_port("HTTP"), 80);
        assert_eq!(default_port("https"), 443);
    }
}
