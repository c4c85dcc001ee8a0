//! Per-request error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::transport::ForwardError;
use crate::rewrite::TargetError;

/// Errors that fail a single proxied request.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Malformed request target: {0}")]
    Parse(#[from] TargetError),

    #[error("Forwarding failed: {0}")]
    Forward(#[from] ForwardError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Parse(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forward(ForwardError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
