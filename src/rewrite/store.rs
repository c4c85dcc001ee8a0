//! Active rule generations.
//!
//! # Responsibilities
//! - Build a complete `RuleSet` from configuration
//! - Publish it atomically, replacing the previous generation
//! - Hand out snapshots that stay valid for the whole request
//!
//! # Design Decisions
//! - A `RuleSet` is immutable; reload builds a new one
//! - Any build error leaves the current generation in place
//! - Readers never lock (`ArcSwap`)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::ProxyConfig;
use crate::rewrite::domain::{DomainRewriter, Origin};
use crate::rewrite::registry::RewriterRegistry;
use crate::rewrite::target::RewriteTarget;
use crate::rewrite::uri::UriRewriter;
use crate::rewrite::RewriteError;
use crate::security::access_control::AccessFilter;

/// One configuration generation of rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub generation: u64,
    pub access: AccessFilter,
    pub domains: Vec<DomainRewriter>,
    pub uris: Vec<Box<dyn UriRewriter>>,
}

impl RuleSet {
    /// Compile every rule of `config`. Fails on the first bad rule.
    pub fn build(config: &ProxyConfig, registry: &RewriterRegistry) -> Result<Self, RewriteError> {
        let access = AccessFilter::new(&config.allows, &config.denys)?;

        let domains = config
            .domains
            .iter()
            .map(DomainRewriter::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let uris = config
            .uris
            .iter()
            .map(|rule| registry.build(rule))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generation: 0,
            access,
            domains,
            uris,
        })
    }

    /// Origin from the first matching domain rule, else the request's own.
    pub fn resolve_origin(&self, target: &RewriteTarget) -> Origin {
        self.domains
            .iter()
            .find(|rw| rw.matches(target))
            .map(|rw| rw.rewrite(target))
            .unwrap_or_else(|| Origin::of(target))
    }

    /// Path from the first matching URI rule, else the original path+query.
    pub fn resolve_path(&self, target: &RewriteTarget) -> String {
        self.uris
            .iter()
            .find(|rw| rw.matches(target))
            .map(|rw| rw.rewrite(target))
            .unwrap_or_else(|| target.path_and_query().to_string())
    }

    /// Final upstream URL for a target.
    pub fn resolve_url(&self, target: &RewriteTarget) -> String {
        let path = self.resolve_path(target);
        if is_absolute_url(&path) {
            return path;
        }
        format!("{}{}", self.resolve_origin(target), path)
    }
}

/// A rewritten path that is itself a complete URL.
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Holds the active `RuleSet` and the registry used to rebuild it.
#[derive(Debug)]
pub struct RuleStore {
    registry: RewriterRegistry,
    current: ArcSwap<RuleSet>,
    generations: AtomicU64,
}

impl RuleStore {
    /// Build the first generation. Fails if any rule is invalid.
    pub fn new(config: &ProxyConfig, registry: RewriterRegistry) -> Result<Self, RewriteError> {
        let mut rules = RuleSet::build(config, &registry)?;
        rules.generation = 1;

        tracing::info!(
            domains = rules.domains.len(),
            uris = rules.uris.len(),
            allows = config.allows.len(),
            denys = config.denys.len(),
            "Rules loaded"
        );

        Ok(Self {
            registry,
            current: ArcSwap::from_pointee(rules),
            generations: AtomicU64::new(1),
        })
    }

    /// Snapshot of the active generation.
    pub fn load(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Build a new generation and swap it in. On error nothing changes.
    pub fn reload(&self, config: &ProxyConfig) -> Result<u64, RewriteError> {
        let mut rules = RuleSet::build(config, &self.registry)?;
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        rules.generation = generation;

        tracing::info!(
            generation,
            domains = rules.domains.len(),
            uris = rules.uris.len(),
            "Rules reloaded"
        );

        self.current.store(Arc::new(rules));
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DomainRule, UriRule};

    fn domain(pattern: &str, replace: &str, port: Option<u16>) -> DomainRule {
        DomainRule {
            pattern: pattern.to_string(),
            replace: replace.to_string(),
            port,
        }
    }

    fn regex_uri(pattern: &str, replace: &str) -> UriRule {
        UriRule {
            rewriter: "RegexRewriter".to_string(),
            pattern: Some(pattern.to_string()),
            replace: Some(replace.to_string()),
            full: false,
        }
    }

    fn build(config: &ProxyConfig) -> RuleSet {
        RuleSet::build(config, &RewriterRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_first_domain_match_wins() {
        let mut config = ProxyConfig::default();
        config.domains.push(domain(r"api\.", "first.com", None));
        config.domains.push(domain(r"api\.old", "second.com", None));

        let rules = build(&config);
        let target = RewriteTarget::new("http", "api.old.com", None, "/");
        assert_eq!(rules.resolve_origin(&target).host, "first.com");
    }

    #[test]
    fn test_first_uri_match_wins() {
        let mut config = ProxyConfig::default();
        config.uris.push(regex_uri(r"/(a)", "/first/${0}"));
        config.uris.push(regex_uri(r"/(a)", "/second/${0}"));

        let rules = build(&config);
        let target = RewriteTarget::new("http", "h", None, "/a");
        assert_eq!(rules.resolve_path(&target), "/first/a");
    }

    #[test]
    fn test_no_rules_round_trip() {
        let rules = build(&ProxyConfig::default());
        let target = RewriteTarget::new("https", "example.com", Some(8443), "/p?q=1");
        assert_eq!(rules.resolve_url(&target), "https://example.com:8443/p?q=1");

        let target = RewriteTarget::new("http", "example.com", None, "/p");
        assert_eq!(rules.resolve_url(&target), "http://example.com:80/p");
    }

    #[test]
    fn test_absolute_uri_overrides_domain() {
        let mut config = ProxyConfig::default();
        config.domains.push(domain(".*", "ignored.com", Some(1)));
        config.uris.push(regex_uri(r"/(x)", "https://other.example/${0}"));

        let rules = build(&config);
        let target = RewriteTarget::new("http", "api.old.com", None, "/x");
        assert_eq!(rules.resolve_url(&target), "https://other.example/x");
    }

    #[test]
    fn test_end_to_end_resolution() {
        let mut config = ProxyConfig::default();
        config.domains.push(domain(r"^api\.old\.com$", "api.new.com", None));
        config.uris.push(regex_uri(r"^/old/(\d+)", "/new/${0}"));

        let rules = build(&config);
        let target = RewriteTarget::new("http", "api.old.com", None, "/old/42?x=1");
        assert_eq!(rules.resolve_url(&target), "http://api.new.com:80/new/42?x=1");
    }

    #[test]
    fn test_reload_swaps_generation() {
        let mut config = ProxyConfig::default();
        config.domains.push(domain("a", "one.com", None));
        let store = RuleStore::new(&config, RewriterRegistry::with_builtins()).unwrap();

        let before = store.load();
        assert_eq!(before.generation, 1);

        config.domains[0].replace = "two.com".to_string();
        assert_eq!(store.reload(&config).unwrap(), 2);

        let target = RewriteTarget::new("http", "a", None, "/");
        // A snapshot taken earlier keeps answering from its own generation.
        assert_eq!(before.resolve_origin(&target).host, "one.com");
        assert_eq!(store.load().resolve_origin(&target).host, "two.com");
    }

    #[test]
    fn test_failed_reload_keeps_current_rules() {
        let mut config = ProxyConfig::default();
        config.domains.push(domain("a", "one.com", None));
        let store = RuleStore::new(&config, RewriterRegistry::with_builtins()).unwrap();

        let mut bad = config.clone();
        bad.domains.push(domain("b", "two.com", None));
        bad.uris.push(UriRule {
            rewriter: "Missing".to_string(),
            pattern: None,
            replace: None,
            full: false,
        });

        assert!(matches!(
            store.reload(&bad).unwrap_err(),
            RewriteError::UnknownRewriterKind(_)
        ));
        let rules = store.load();
        assert_eq!(rules.generation, 1);
        assert_eq!(rules.domains.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_fails_initial_load() {
        let mut config = ProxyConfig::default();
        config.denys.push("[".to_string());
        assert!(RuleStore::new(&config, RewriterRegistry::with_builtins()).is_err());
    }
}
