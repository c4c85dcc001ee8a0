//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (client address vs allows/denys)
//!     → headers.rs (strip Host and hop-by-hop headers for upstream)
//!
//! Upstream response:
//!     → headers.rs (Content-Type/Content-Length allow-list + CORS)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a rejected client gets 403 before any rewriting happens
//! - No upstream response header reaches the client unless allow-listed

pub mod access_control;
pub mod headers;

pub use access_control::{AccessFilter, Verdict};
