//! Rewrite subsystem.
//!
//! # Data Flow
//! ```text
//! Config (domains[], uris[])
//!     → pattern.rs (compile regex, anchored at start)
//!     → domain.rs / uri.rs (rewriters built from rules)
//!     → registry.rs (URI rewriter kind name → factory)
//!     → store.rs (immutable RuleSet, swapped atomically on reload)
//!
//! Per request:
//!     target.rs (scheme/host/port/path+query)
//!     → first matching domain rewriter → origin
//!     → first matching URI rewriter → path (or absolute URL)
//! ```
//!
//! # Design Decisions
//! - Rules are compiled once per configuration generation
//! - First match wins, in configuration order
//! - A bad pattern or unknown rewriter kind rejects the whole generation

pub mod domain;
pub mod pattern;
pub mod registry;
pub mod store;
pub mod target;
pub mod uri;

use thiserror::Error;

pub use domain::{DomainRewriter, Origin};
pub use pattern::PatternRule;
pub use registry::{RewriterFactory, RewriterRegistry};
pub use store::{RuleSet, RuleStore};
pub use target::{RewriteTarget, TargetError};
pub use uri::{RegexRewriter, UriRewriter};

/// Errors raised while building a rule generation.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown rewriter kind: {0}")]
    UnknownRewriterKind(String),

    #[error("Rewriter kind already registered: {0}")]
    DuplicateRewriterKind(String),
}
