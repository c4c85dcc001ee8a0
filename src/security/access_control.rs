//! Client address filtering.
//!
//! # Responsibilities
//! - Compile `allows` and `denys` patterns (anchored at start, like rewrite rules)
//! - Decide whether a client address may use the proxy
//!
//! # Design Decisions
//! - Empty `denys` never denies. Non-empty `denys` denies every client that
//!   matches none of its patterns: a matching deny pattern exempts the client.
//! - Empty `allows` allows everyone; otherwise a client must match one pattern.
//! - Deny is evaluated first and short-circuits.

use regex::Regex;

use crate::rewrite::pattern::compile_anchored;
use crate::rewrite::RewriteError;

/// Result of running the filter on a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Permit,
    Forbidden,
}

/// Allow/deny pattern lists applied to the client address.
#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    allows: Vec<Regex>,
    denys: Vec<Regex>,
}

impl AccessFilter {
    pub fn new(allows: &[String], denys: &[String]) -> Result<Self, RewriteError> {
        Ok(Self {
            allows: compile_all(allows)?,
            denys: compile_all(denys)?,
        })
    }

    pub fn is_denied(&self, client: &str) -> bool {
        if self.denys.is_empty() {
            return false;
        }
        !self.denys.iter().any(|re| re.is_match(client))
    }

    pub fn is_allowed(&self, client: &str) -> bool {
        self.allows.is_empty() || self.allows.iter().any(|re| re.is_match(client))
    }

    pub fn check(&self, client: &str) -> Verdict {
        if self.is_denied(client) || !self.is_allowed(client) {
            Verdict::Forbidden
        } else {
            Verdict::Permit
        }
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, RewriteError> {
    patterns.iter().map(|p| compile_anchored(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(allows: &[&str], denys: &[&str]) -> AccessFilter {
        let to_vec = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        AccessFilter::new(&to_vec(allows), &to_vec(denys)).unwrap()
    }

    #[test]
    fn test_empty_lists_permit_everyone() {
        let f = filter(&[], &[]);
        assert!(!f.is_denied("8.8.8.8"));
        assert!(f.is_allowed("8.8.8.8"));
        assert_eq!(f.check("8.8.8.8"), Verdict::Permit);
    }

    #[test]
    fn test_deny_pattern_match_exempts() {
        let f = filter(&[], &[r"10\."]);
        assert!(!f.is_denied("10.0.0.5"));
        assert!(f.is_denied("8.8.8.8"));
        assert_eq!(f.check("8.8.8.8"), Verdict::Forbidden);
    }

    #[test]
    fn test_allow_list() {
        let f = filter(&[r"192\.168\."], &[]);
        assert!(f.is_allowed("192.168.1.2"));
        assert!(!f.is_allowed("1.2.3.4"));
        assert_eq!(f.check("1.2.3.4"), Verdict::Forbidden);
    }

    #[test]
    fn test_patterns_anchor_at_start() {
        let f = filter(&[r"168\."], &[]);
        assert!(!f.is_allowed("192.168.1.2"));
    }

    #[test]
    fn test_both_lists_must_pass() {
        let f = filter(&[r"10\.0\."], &[r"10\."]);
        assert_eq!(f.check("10.0.0.1"), Verdict::Permit);
        // Survives the deny check but is not on the allow list.
        assert_eq!(f.check("10.1.0.1"), Verdict::Forbidden);
        assert_eq!(f.check("127.0.0.1"), Verdict::Forbidden);
    }

    #[test]
    fn test_invalid_pattern_fails() {
        assert!(AccessFilter::new(&["(".to_string()], &[]).is_err());
    }
}
