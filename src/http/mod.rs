//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method filter, middleware)
//!     → request.rs (request ID)
//!     → pipeline.rs (access filter, rewrite, forward)
//!     → transport.rs (upstream request)
//!     → response.rs (filter headers, re-chunk body)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use pipeline::Pipeline;
pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
pub use transport::{ForwardError, ForwardRequest, HttpTransport, Transport};
