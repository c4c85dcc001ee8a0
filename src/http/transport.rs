//! Outbound request transport.
//!
//! # Responsibilities
//! - Issue the rewritten request (method, URL, headers, body) upstream
//! - Return status, headers and a streaming body
//! - Enforce the per-request deadline
//!
//! # Design Decisions
//! - The pipeline only sees the `Transport` trait; tests substitute their own
//! - Redirects are relayed to the client, never followed
//! - System proxy variables are ignored so the proxy never loops through itself

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, HttpBody};
use axum::http::{HeaderMap, Method, Response};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::resilience::timeouts::with_deadline;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Body,
    pub timeout: Duration,
}

/// Errors raised while forwarding a request.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("invalid upstream URL `{0}`")]
    InvalidUrl(String),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] BoxError),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        ForwardError::Upstream(Box::new(e))
    }
}

/// Sends requests to upstream servers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<Response<Body>, ForwardError>;
}

/// `reqwest`-backed transport for `http` and `https` targets.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            // Each request gets its own connection.
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn forward(&self, request: ForwardRequest) -> Result<Response<Body>, ForwardError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|_| ForwardError::InvalidUrl(request.url.clone()))?;

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);

        // Bodyless requests must not turn into chunked uploads.
        if request.body.size_hint().exact() != Some(0) {
            builder = builder.body(reqwest::Body::wrap_stream(request.body.into_data_stream()));
        }

        let upstream = with_deadline(request.timeout, async {
            builder.send().await.map_err(ForwardError::from)
        })
        .await?;

        let status = upstream.status();
        let headers = upstream.headers().clone();

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
