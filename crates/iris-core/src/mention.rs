//! Mention detection: does a message text refer to a given username?
//!
//! A mention is a whole-word, case-insensitive occurrence of the name.
//! No `@` marker is required: `"ping bob"` mentions `bob`, `"bobby"` does not.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use regex::Regex;
use tracing::{debug, warn};

/// Compiled patterns kept before the cache is reset.
const MAX_CACHED_PATTERNS: usize = 1024;

/// Whole-word mention matcher with one compiled pattern per username.
///
/// Shared by every routing call of a handler; patterns are built on first
/// use of a name and reused afterwards.
#[derive(Default)]
pub struct MentionMatcher {
    /// Username → pattern; `None` when the pattern could not be built.
    patterns: RwLock<HashMap<String, Option<Regex>>>,
}

impl MentionMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `username` occurs in `text` as a whole word, ignoring case.
    ///
    /// Regex metacharacters in `username` are matched literally. Never fails:
    /// an empty name or a pattern that cannot be compiled counts as no mention.
    pub fn is_mentioned(&self, username: &str, text: &str) -> bool {
        if username.is_empty() {
            return false;
        }

        match self.pattern(username) {
            Some(re) => re.is_match(text),
            None => false,
        }
    }

    /// Cached pattern for `username`, compiled on first use.
    fn pattern(&self, username: &str) -> Option<Regex> {
        {
            let patterns = self.patterns.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(pattern) = patterns.get(username) {
                return pattern.clone();
            }
        }

        let compiled = mention_pattern(username);
        let mut patterns = self.patterns.write().unwrap_or_else(PoisonError::into_inner);
        if patterns.len() >= MAX_CACHED_PATTERNS {
            debug!(cached = patterns.len(), "mention pattern cache full, clearing");
            patterns.clear();
        }
        patterns
            .entry(username.to_string())
            .or_insert(compiled)
            .clone()
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.patterns.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Build the case-insensitive whole-word pattern for `username`.
///
/// Each side is bounded by a string end or a non-word character, so names
/// with punctuation at either end (`[away]`, `a.b.`) still match. There is
/// no lookaround; the neighbouring character is part of the match.
fn mention_pattern(username: &str) -> Option<Regex> {
    let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(username));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(username = %username, error = %e, "could not build mention pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_mentioned(username: &str, text: &str) -> bool {
        MentionMatcher::new().is_mentioned(username, text)
    }

    #[test]
    fn test_case_insensitive_match() {
        assert!(is_mentioned("alice", "hey ALICE how are you"));
        assert!(is_mentioned("Alice", "hey alice"));
    }

    #[test]
    fn test_no_partial_word_match() {
        assert!(!is_mentioned("al", "alice is here"));
        assert!(!is_mentioned("bob", "bobby tables"));
        assert!(!is_mentioned("bob", "kebob"));
        assert!(!is_mentioned("bob", "bob_smith says hi"));
    }

    #[test]
    fn test_special_characters_are_literal() {
        assert!(is_mentioned("a.b", "talking about a.b today"));
        assert!(!is_mentioned("a.b", "talking about axb today"));
        assert!(is_mentioned("c++", "who knows c++ here"));
        assert!(is_mentioned("[away]", "ping [away] please"));
        assert!(is_mentioned("x|y", "x|y"));
        assert!(!is_mentioned("x|y", "x"));
    }

    #[test]
    fn test_boundaries_at_string_edges() {
        assert!(is_mentioned("bob", "bob"));
        assert!(is_mentioned("bob", "bob: ping"));
        assert!(is_mentioned("bob", "thanks bob"));
        assert!(is_mentioned("bob", "@bob hello"));
        assert!(is_mentioned("bob", "(bob)"));
    }

    #[test]
    fn test_no_leading_marker_required() {
        assert!(is_mentioned("carol", "carol, lunch?"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(!is_mentioned("", "anything at all"));
        assert!(!is_mentioned("bob", ""));
    }

    #[test]
    fn test_unicode_text() {
        assert!(is_mentioned("zoë", "bonjour ZOË !"));
        assert!(!is_mentioned("zoë", "zoëlle"));
    }

    #[test]
    fn test_pattern_compiled_once_per_name() {
        let matcher = MentionMatcher::new();
        assert!(matcher.is_mentioned("bob", "hi bob"));
        assert!(!matcher.is_mentioned("bob", "hi bobby"));
        assert!(matcher.is_mentioned("carol", "carol?"));
        assert!(!matcher.is_mentioned("", "anything"));
        assert_eq!(matcher.cached(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let matcher = MentionMatcher::new();
        for i in 0..MAX_CACHED_PATTERNS + 10 {
            assert!(matcher.is_mentioned(&format!("user{i}"), &format!("ping user{i}")));
        }
        assert!(matcher.cached() <= MAX_CACHED_PATTERNS);
    }

    #[test]
    fn test_shared_across_threads() {
        let matcher = std::sync::Arc::new(MentionMatcher::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let matcher = matcher.clone();
                std::thread::spawn(move || {
                    (0..100).all(|_| matcher.is_mentioned("dave", "dave: ship it"))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(matcher.cached(), 1);
    }
}
