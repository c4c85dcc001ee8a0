//! Compiled pattern plus replacement template.
//!
//! # Responsibilities
//! - Compile rule patterns with anchored-at-start semantics
//! - Substitute `${name}` and `${i}` placeholders from capture groups
//!
//! # Design Decisions
//! - `${i}` is 0-based: `${0}` is the first capture group, not the whole match
//! - Named lookup wins over positional lookup for the same token
//! - Substitution is a single pass; group values are never re-scanned

use regex::{Captures, Regex};

use crate::rewrite::RewriteError;

/// Compile `pattern` so that it only matches at the start of a subject.
pub fn compile_anchored(pattern: &str) -> Result<Regex, RewriteError> {
    let invalid = |source: regex::Error| RewriteError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    };

    // Compiled bare first so a pattern like `a)(b` cannot balance against the wrapper.
    Regex::new(pattern).map_err(invalid)?;
    // The wrapper group keeps inline flags like `(?i)` scoped to the user pattern.
    Regex::new(&format!(r"\A(?:{})", pattern)).map_err(invalid)
}

/// A regex with an optional replacement template.
#[derive(Debug, Clone)]
pub struct PatternRule {
    replace: Option<String>,
    regex: Option<Regex>,
}

impl PatternRule {
    /// Build a rule. An empty or missing pattern yields a rule that never matches.
    pub fn new(pattern: Option<&str>, replace: Option<&str>) -> Result<Self, RewriteError> {
        let regex = pattern
            .filter(|p| !p.is_empty())
            .map(compile_anchored)
            .transpose()?;

        Ok(Self {
            replace: replace.filter(|r| !r.is_empty()).map(str::to_string),
            regex,
        })
    }

    pub fn replace(&self) -> Option<&str> {
        self.replace.as_deref()
    }

    /// True iff the pattern matches at the start of `subject`.
    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(subject))
    }

    /// Capture groups of the match at the start of `subject`.
    pub fn captures<'s>(&self, subject: &'s str) -> Option<Captures<'s>> {
        self.regex.as_ref()?.captures(subject)
    }

    /// Number of capture groups, excluding the implicit whole-match group.
    pub fn group_count(&self) -> usize {
        self.regex
            .as_ref()
            .map(|re| re.captures_len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Expand `template` against the captures of a successful match.
    pub fn substitute(&self, template: &str, caps: &Captures<'_>) -> String {
        match &self.regex {
            Some(re) => substitute(template, re, caps),
            None => template.to_string(),
        }
    }
}

/// Replace `${name}` and `${i}` tokens in `template` with capture group text.
///
/// Tokens that name no group, or index past the last group, are kept verbatim.
/// Groups that did not participate in the match expand to the empty string.
pub fn substitute(template: &str, regex: &Regex, caps: &Captures<'_>) -> String {
    let group_count = regex.captures_len().saturating_sub(1);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated token, copy the remainder as-is.
            out.push_str(&rest[start..]);
            return out;
        };

        let token = &after[..end];
        match group_text(token, regex, caps, group_count) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn group_text<'s>(
    token: &str,
    regex: &Regex,
    caps: &Captures<'s>,
    group_count: usize,
) -> Option<&'s str> {
    if regex.capture_names().flatten().any(|name| name == token) {
        return Some(caps.name(token).map_or("", |m| m.as_str()));
    }

    let index: usize = token.parse().ok()?;
    if index < group_count {
        Some(caps.get(index + 1).map_or("", |m| m.as_str()))
    } else {
        None
    }
}
