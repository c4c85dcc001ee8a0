//! Per-request proxy pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request + client address
//!     → access filter          (rejected → 403)
//!     → RewriteTarget          (malformed → 400)
//!     → RuleSet::resolve_url   (domain rule, then URI rule)
//!     → Transport::forward     (timeout → 504, failure → 502)
//!     → response::relay        (status, 2 headers + CORS, chunked body)
//! ```
//!
//! # Design Decisions
//! - One `RuleSet` snapshot is taken per request; a concurrent reload
//!   never mixes generations within a request
//! - Failures only affect the request that hit them

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};

use crate::error::ProxyError;
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::http::transport::{ForwardError, ForwardRequest, Transport};
use crate::observability::metrics;
use crate::rewrite::{RewriteTarget, RuleSet, RuleStore};
use crate::security::headers::upstream_request_headers;
use crate::security::Verdict;

pub struct Pipeline {
    rules: Arc<RuleStore>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(rules: Arc<RuleStore>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            rules,
            transport,
            timeout,
        }
    }

    /// Proxy one request from `client`.
    pub async fn handle(
        &self,
        client: SocketAddr,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let start = Instant::now();
        let rules = self.rules.load();

        let request_id = request.request_id().to_string();
        let method = request.method().clone();
        let version = request.version();
        let path = request.uri().to_string();
        let client_host = client.ip().to_canonical().to_string();

        if rules.access.check(&client_host) == Verdict::Forbidden {
            tracing::warn!(
                request_id = %request_id,
                client = %client_host,
                method = %method,
                path = %path,
                "Client rejected by access filter"
            );
            metrics::record_request(method.as_str(), 403, "forbidden", start);
            return Ok(response::forbidden());
        }

        match self.forward(&rules, request).await {
            Ok((url, upstream)) => {
                let status = upstream.status();
                tracing::info!(
                    request_id = %request_id,
                    client = %client_host,
                    method = %method,
                    url = %url,
                    version = ?version,
                    status = status.as_u16(),
                    generation = rules.generation,
                    "Forwarded request"
                );
                metrics::record_request(method.as_str(), status.as_u16(), "forwarded", start);
                Ok(response::relay(upstream))
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    version = ?version,
                    error = %e,
                    "Request failed"
                );
                let outcome = match &e {
                    ProxyError::Parse(_) => "bad_request",
                    ProxyError::Forward(ForwardError::Timeout(_)) => "timeout",
                    ProxyError::Forward(_) => "upstream_error",
                };
                metrics::record_request(method.as_str(), e.status().as_u16(), outcome, start);
                Err(e)
            }
        }
    }

    async fn forward(
        &self,
        rules: &RuleSet,
        request: Request<Body>,
    ) -> Result<(String, Response<Body>), ProxyError> {
        let (parts, body) = request.into_parts();
        let target = RewriteTarget::from_request(&parts.uri, &parts.headers)?;
        let url = rules.resolve_url(&target);

        tracing::debug!(rewrite_target = %target, url = %url, "Resolved upstream URL");

        let upstream = self
            .transport
            .forward(ForwardRequest {
                method: parts.method,
                url: url.clone(),
                headers: upstream_request_headers(&parts.headers),
                body,
                timeout: self.timeout,
            })
            .await?;

        Ok((url, upstream))
    }
}
