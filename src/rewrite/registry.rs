//! URI rewriter kinds.
//!
//! Maps the `rewriter` name used in configuration to a factory building that
//! kind of rewriter. Kinds are registered at startup, before any rule is built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::UriRule;
use crate::rewrite::uri::{RegexRewriter, UriRewriter};
use crate::rewrite::RewriteError;

/// Builds a URI rewriter from its configuration entry.
pub type RewriterFactory =
    Arc<dyn Fn(&UriRule) -> Result<Box<dyn UriRewriter>, RewriteError> + Send + Sync>;

/// Append-only map from rewriter kind name to factory.
#[derive(Clone, Default)]
pub struct RewriterRegistry {
    factories: HashMap<String, RewriterFactory>,
}

impl RewriterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            RegexRewriter::KIND.to_string(),
            Arc::new(RegexRewriter::from_config),
        );
        registry
    }

    /// Register a kind. A name can only be registered once.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RewriteError>
    where
        F: Fn(&UriRule) -> Result<Box<dyn UriRewriter>, RewriteError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RewriteError::DuplicateRewriterKind(name));
        }

        tracing::debug!(kind = %name, "Rewriter kind registered");
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Look up the factory for a kind.
    pub fn resolve(&self, name: &str) -> Result<&RewriterFactory, RewriteError> {
        self.factories
            .get(name)
            .ok_or_else(|| RewriteError::UnknownRewriterKind(name.to_string()))
    }

    /// Resolve the rule's kind and build the rewriter.
    pub fn build(&self, rule: &UriRule) -> Result<Box<dyn UriRewriter>, RewriteError> {
        let factory = self.resolve(&rule.rewriter)?;
        factory(rule)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for RewriterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
