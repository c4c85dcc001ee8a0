//! URI rewriting.
//!
//! # Responsibilities
//! - Define the `UriRewriter` capability shared by all rewriter kinds
//! - Provide the built-in `RegexRewriter`
//!
//! # Design Decisions
//! - Subject is the full URL when `by_url` is set, else path+query
//! - A pattern without capture groups leaves the subject unchanged
//! - The expanded template replaces the matched prefix of the subject
//! - Without a template the subject itself is expanded, as a whole
//! - A result starting with `http://` or `https://` replaces the whole target

use std::fmt;

use crate::config::UriRule;
use crate::rewrite::pattern::PatternRule;
use crate::rewrite::target::RewriteTarget;
use crate::rewrite::RewriteError;

/// A rule that may rewrite the path (or full URL) of a request.
pub trait UriRewriter: Send + Sync + fmt::Debug {
    /// Returns true if this rewriter applies to the target.
    fn matches(&self, target: &RewriteTarget) -> bool;

    /// New path+query, or an absolute URL. Only called after `matches`.
    fn rewrite(&self, target: &RewriteTarget) -> String;
}

/// The text a URI rule looks at.
pub fn subject_of(target: &RewriteTarget, by_url: bool) -> String {
    if by_url {
        target.full_url()
    } else {
        target.path_and_query().to_string()
    }
}

/// Generic capture-group substitution.
#[derive(Debug, Clone)]
pub struct RegexRewriter {
    rule: PatternRule,
    by_url: bool,
}

impl RegexRewriter {
    pub const KIND: &'static str = "RegexRewriter";

    pub fn new(pattern: Option<&str>, replace: Option<&str>, by_url: bool) -> Result<Self, RewriteError> {
        Ok(Self {
            rule: PatternRule::new(pattern, replace)?,
            by_url,
        })
    }

    /// Factory registered under [`RegexRewriter::KIND`].
    pub fn from_config(rule: &UriRule) -> Result<Box<dyn UriRewriter>, RewriteError> {
        let rewriter = Self::new(rule.pattern.as_deref(), rule.replace.as_deref(), rule.full)?;
        Ok(Box::new(rewriter))
    }
}

impl UriRewriter for RegexRewriter {
    fn matches(&self, target: &RewriteTarget) -> bool {
        self.rule.is_match(&subject_of(target, self.by_url))
    }

    fn rewrite(&self, target: &RewriteTarget) -> String {
        let subject = subject_of(target, self.by_url);
        if self.rule.group_count() == 0 {
            return subject;
        }

        let rewritten = self.rule.captures(&subject).map(|caps| match self.rule.replace() {
            // The expansion replaces the matched prefix; the unmatched tail is kept.
            Some(template) => {
                let matched_end = caps.get(0).map_or(0, |m| m.end());
                let mut out = self.rule.substitute(template, &caps);
                out.push_str(&subject[matched_end..]);
                out
            }
            None => self.rule.substitute(&subject, &caps),
        });

        rewritten.unwrap_or(subject)
    }
}
