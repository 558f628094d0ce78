//! Question sanitizing: whitespace normalization and blocked-term censoring.
//!
//! Blocked terms are matched case-insensitively as whole words, so
//! blocking `"ass"` leaves `"class"` alone. A word boundary is required
//! only on a side where the term begins or ends with a word character,
//! so terms like `"c++"` still match. Every occurrence is replaced with
//! [`PLACEHOLDER`]. All terms are compiled into one alternation, longest
//! first, and applied in a single pass, so the result does not depend on
//! term order.
//!
//! A term that could match any span overlapping a placeholder (inside
//! it, across one of its brackets, or around it) is ignored, which keeps
//! sanitizing idempotent.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::sanitize::Sanitizer;
//!
//! let s = Sanitizer::new(["damn"]).unwrap();
//! assert_eq!(s.sanitize("This  is a DAMN test "), "This is a [CENSORED] test");
//! ```

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use crate::error::SanitizeError;
use crate::text::normalize_whitespace;

/// Replacement for every blocked term.
pub const PLACEHOLDER: &str = "[CENSORED]";

/// Compiled blocked-term filter.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    terms: BTreeSet<String>,
    pattern: Option<Regex>,
}

impl Sanitizer {
    /// Compile a filter for `terms`. Terms are trimmed and lower-cased;
    /// blank terms are dropped.
    pub fn new<I, S>(terms: I) -> Result<Self, SanitizeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = BTreeSet::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            if matches_placeholder(&term, &compile(&term_pattern(&term))?) {
                continue;
            }
            kept.insert(term);
        }

        if kept.is_empty() {
            return Ok(Self::default());
        }

        let mut ordered: Vec<&String> = kept.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = ordered
            .iter()
            .map(|t| term_pattern(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = compile(&format!("(?:{})", alternation))?;

        Ok(Self {
            terms: kept,
            pattern: Some(pattern),
        })
    }

    /// The normalized blocked terms, in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Collapse whitespace runs, trim, and censor blocked terms.
    pub fn sanitize(&self, text: &str) -> String {
        let text = normalize_whitespace(text);
        match &self.pattern {
            Some(re) => re.replace_all(&text, PLACEHOLDER).into_owned(),
            None => text,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escaped `term`, with `\b` on each side that starts or ends with a word
/// character.
fn term_pattern(term: &str) -> String {
    let left = term.chars().next().is_some_and(is_word_char);
    let right = term.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if left { r"\b" } else { "" },
        regex::escape(term),
        if right { r"\b" } else { "" }
    )
}

fn compile(pattern: &str) -> Result<Regex, SanitizeError> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Whether `re` (compiled from `term`) can match a span overlapping a
/// placeholder.
///
/// Every alignment of `term` against the placeholder that agrees on the
/// shared characters is laid out, surrounded by an empty, a space, or a
/// word neighbour on each side, and searched for a match that touches the
/// placeholder.
fn matches_placeholder(term: &str, re: &Regex) -> bool {
    let t: Vec<char> = term.chars().collect();
    let p: Vec<char> = PLACEHOLDER.chars().collect();
    let (tl, pl) = (t.len() as isize, p.len() as isize);

    for offset in (1 - tl)..pl {
        let Some((merged, span)) = overlay(&t, &p, offset) else {
            continue;
        };
        for left in ["", " ", "a"] {
            for right in ["", " ", "a"] {
                let hay = format!("{}{}{}", left, merged, right);
                let (start, end) = (span.0 + left.len(), span.1 + left.len());
                if re.find_iter(&hay).any(|m| m.start() < end && m.end() > start) {
                    return true;
                }
            }
        }
    }
    false
}

/// `term` laid over the placeholder with the term starting `offset`
/// chars after it. Returns the merged text and the placeholder's byte
/// span in it, or `None` when overlapping chars disagree.
fn overlay(t: &[char], p: &[char], offset: isize) -> Option<(String, (usize, usize))> {
    let (tl, pl) = (t.len() as isize, p.len() as isize);
    let mut merged = String::new();
    let (mut start, mut end) = (0, 0);
    for pos in offset.min(0)..(offset + tl).max(pl) {
        if pos == 0 {
            start = merged.len();
        }
        let tc = (pos >= offset && pos < offset + tl).then(|| t[(pos - offset) as usize]);
        let pc = (pos >= 0 && pos < pl).then(|| p[pos as usize]);
        match (tc, pc) {
            (Some(a), Some(b)) if !b.to_lowercase().eq(a.to_lowercase()) => return None,
            (_, Some(b)) => merged.push(b),
            (Some(a), None) => merged.push(a),
            (None, None) => {}
        }
        if pos == pl - 1 {
            end = merged.len();
        }
    }
    Some((merged, (start, end)))
}

/// One-shot form of [`Sanitizer::sanitize`].
pub fn sanitize<I, S>(text: &str, blocked_terms: I) -> Result<String, SanitizeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(Sanitizer::new(blocked_terms)?.sanitize(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_censors_blocked_term() {
        assert_eq!(
            sanitize("This is a damn test", ["damn"]).unwrap(),
            "This is a [CENSORED] test"
        );
    }

    #[test]
    fn test_case_insensitive() {
        let s = Sanitizer::new(["Damn"]).unwrap();
        assert_eq!(s.sanitize("DAMN it, damn"), "[CENSORED] it, [CENSORED]");
    }

    #[test]
    fn test_whole_word_only() {
        let s = Sanitizer::new(["ass"]).unwrap();
        assert_eq!(s.sanitize("a class of assets"), "a class of assets");
        assert_eq!(s.sanitize("ass."), "[CENSORED].");
    }

    #[test]
    fn test_whitespace_normalized() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("  many\t\tspaces \n here  "), "many spaces here");
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let s = Sanitizer::new(["a.b"]).unwrap();
        assert_eq!(s.sanitize("a.b axb"), "[CENSORED] axb");
    }

    #[test]
    fn test_order_independent() {
        let text = "heck darn heckdarn darn heck";
        let a = sanitize(text, ["heck", "darn"]).unwrap();
        let b = sanitize(text, ["darn", "heck"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "[CENSORED] [CENSORED] heckdarn [CENSORED] [CENSORED]");
    }

    #[test]
    fn test_overlapping_phrases_prefer_longest() {
        let s = Sanitizer::new(["bad", "bad word"]).unwrap();
        assert_eq!(s.sanitize("a bad word here"), "a [CENSORED] here");
    }

    #[test]
    fn test_idempotent() {
        let s = Sanitizer::new(["damn", "censored", "heck"]).unwrap();
        let once = s.sanitize("  damn it   heck Censored ");
        let twice = s.sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_placeholder_term_ignored() {
        let s = Sanitizer::new(["censored", "  ", "x"]).unwrap();
        assert_eq!(s.terms().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_punctuation_edged_terms_match() {
        let s = Sanitizer::new(["c++", "-rf"]).unwrap();
        assert_eq!(s.sanitize("I like C++ a lot"), "I like [CENSORED] a lot");
        assert_eq!(s.sanitize("rm -rf now"), "rm [CENSORED] now");
        // the word side still needs a boundary
        assert_eq!(s.sanitize("abc++ -rfx"), "abc++ -rfx");
    }

    #[test]
    fn test_terms_spanning_placeholder_edges_ignored() {
        let s = Sanitizer::new(["[censored", "]]", "] x", "damn"]).unwrap();
        assert_eq!(s.terms().collect::<Vec<_>>(), vec!["damn"]);
        let once = s.sanitize("a[censored b damn] x");
        assert_eq!(once, "a[censored b [CENSORED]] x");
        assert_eq!(s.sanitize(&once), once);
    }

    #[test]
    fn test_idempotent_with_punctuation_terms() {
        let s = Sanitizer::new(["c++", "damn", "d"]).unwrap();
        let once = s.sanitize("damn C++ d c++d");
        assert_eq!(
            once,
            "[CENSORED] [CENSORED] [CENSORED] [CENSORED][CENSORED]"
        );
        assert_eq!(s.sanitize(&once), once);
    }

    #[test]
    fn test_no_terms_passthrough() {
        let s = Sanitizer::new(Vec::<String>::new()).unwrap();
        assert_eq!(s.sanitize("Hello  world"), "Hello world");
    }
}
