//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rewrite proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Directory for external rewriter plugins. Only registered kinds are used.
    pub plugin_dir: String,

    /// Client address patterns that may use the proxy (empty = everyone).
    pub allows: Vec<String>,

    /// Client address patterns exempt from the implicit deny (empty = no deny).
    pub denys: Vec<String>,

    /// Domain rewrite rules, in priority order.
    pub domains: Vec<DomainRule>,

    /// URI rewrite rules, in priority order.
    pub uris: Vec<UriRule>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5008").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5008".to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to answer a forwarded request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format (pretty, json).
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Directory for the rotating `stdout.log` files. Empty disables file logging.
    pub log_dir: String,

    /// Rotated log files kept on disk.
    pub log_max_files: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            log_dir: String::new(),
            log_max_files: 30,
        }
    }
}

/// Rewrites the origin of requests whose host matches `pattern`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DomainRule {
    /// Host pattern (regex, matched at the start of the host).
    pub pattern: String,

    /// Replacement host; may reference `${name}` / `${i}` groups. Empty keeps the host.
    #[serde(default)]
    pub replace: String,

    /// Port override.
    #[serde(default)]
    pub port: Option<u16>,
}

/// Rewrites the path (or full URL) of requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UriRule {
    /// Registered rewriter kind, e.g. "RegexRewriter".
    pub rewriter: String,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub replace: Option<String>,

    /// Match against the full URL instead of path+query.
    #[serde(default)]
    pub full: bool,
}
