//! Event name matching
//!
//! Listeners select events by glob patterns over the event name. The
//! `Matcher` trait is the seam; `GlobMatcher` is the default dialect.

use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

/// Decides whether an event name matches any of a listener's patterns
pub trait Matcher: Send + Sync {
    /// Check `name` against `patterns`
    fn is_match(&self, name: &str, patterns: &[String]) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&str, &[String]) -> bool + Send + Sync,
{
    fn is_match(&self, name: &str, patterns: &[String]) -> bool {
        self(name, patterns)
    }
}

/// Glob matcher over dot- and slash-segmented names
///
/// Matching rules:
/// - `*` matches any characters within one segment (excluding `.` and `/`)
/// - `**` matches anything, across segments
/// - `?` matches exactly one character within a segment
/// - a leading `!` negates the pattern
///
/// A name matches when some positive pattern matches and no negated
/// pattern does. If every pattern is negated, any name not excluded
/// matches. Compiled patterns are cached per matcher.
///
/// Unlike `matcher`-package globs, `*` never crosses a `.`: `order.*`
/// matches `order.created` but not `order.item.added`. Use `order.**`
/// to match every descendant.
#[derive(Debug, Default)]
pub struct GlobMatcher {
    /// pattern → compiled regex (`None` if it failed to compile)
    cache: RwLock<HashMap<String, Option<Regex>>>,
}

impl GlobMatcher {
    /// Create a matcher with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn matches_one(&self, pattern: &str, name: &str) -> bool {
        if let Ok(cache) = self.cache.read() {
            if let Some(compiled) = cache.get(pattern) {
                return matches_compiled(compiled.as_ref(), pattern, name);
            }
        }

        let compiled = Regex::new(&glob_to_regex(pattern)).ok();
        let matched = matches_compiled(compiled.as_ref(), pattern, name);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(pattern.to_string(), compiled);
        }

        matched
    }
}

impl Matcher for GlobMatcher {
    fn is_match(&self, name: &str, patterns: &[String]) -> bool {
        if patterns.is_empty() {
            return false;
        }

        let mut has_positive = false;
        let mut positive_hit = false;

        for pattern in patterns {
            if let Some(negated) = pattern.strip_prefix('!') {
                if self.matches_one(negated, name) {
                    return false;
                }
            } else {
                has_positive = true;
                if !positive_hit && self.matches_one(pattern, name) {
                    positive_hit = true;
                }
            }
        }

        positive_hit || !has_positive
    }
}

fn matches_compiled(compiled: Option<&Regex>, pattern: &str, name: &str) -> bool {
    match compiled {
        Some(re) => re.is_match(name),
        None => pattern == name,
    }
}

/// Convert a glob into an anchored regex
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^./]*"),
            '?' => out.push_str("[^./]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}
