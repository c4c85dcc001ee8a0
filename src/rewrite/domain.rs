//! Domain rewriting.
//!
//! # Responsibilities
//! - Match the request host (host only, never the full URL)
//! - Produce a replacement origin `scheme://host:port`
//!
//! # Design Decisions
//! - Scheme always comes from the request
//! - `replace` applies even without capture groups; groups only fill placeholders
//! - Port: rule override, else request port, else scheme default

use std::fmt;

use crate::config::DomainRule;
use crate::rewrite::pattern::PatternRule;
use crate::rewrite::target::{default_port, RewriteTarget};
use crate::rewrite::RewriteError;

/// Scheme, host and port of an upstream server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Origin {
    /// The origin of the request itself, with the port defaulted by scheme.
    pub fn of(target: &RewriteTarget) -> Self {
        Self {
            scheme: target.scheme().to_string(),
            host: target.host().to_string(),
            port: target.effective_port(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Rewrites the origin of requests whose host matches a pattern.
#[derive(Debug, Clone)]
pub struct DomainRewriter {
    rule: PatternRule,
    port: Option<u16>,
}

impl DomainRewriter {
    pub fn new(pattern: &str, replace: &str, port: Option<u16>) -> Result<Self, RewriteError> {
        Ok(Self {
            rule: PatternRule::new(Some(pattern), Some(replace))?,
            port,
        })
    }

    pub fn from_config(rule: &DomainRule) -> Result<Self, RewriteError> {
        Self::new(&rule.pattern, &rule.replace, rule.port)
    }

    pub fn matches(&self, target: &RewriteTarget) -> bool {
        self.rule.is_match(target.host())
    }

    pub fn rewrite(&self, target: &RewriteTarget) -> Origin {
        let template = self.rule.replace().unwrap_or(target.host());
        let host = match self.rule.captures(target.host()) {
            Some(caps) => self.rule.substitute(template, &caps),
            None => template.to_string(),
        };

        let port = self
            .port
            .or(target.port())
            .unwrap_or_else(|| default_port(target.scheme()));

        Origin {
            scheme: target.scheme().to_string(),
            host,
            port,
        }
    }
}
