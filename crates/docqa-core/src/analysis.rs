//! Frequency-based document summaries and keyword extraction.
//!
//! Both utilities are purely statistical and need no model.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::text::{is_stop_word, normalize_whitespace, sentence_spans, words};

pub const DEFAULT_SUMMARY_SENTENCES: usize = 5;
pub const DEFAULT_KEYWORDS: usize = 10;

/// Extractive summary: the `num_sentences` highest-scoring sentences.
///
/// Builds a frequency table of lower-cased non-stop-words, scores each
/// sentence by the summed frequency of the distinct table words it
/// contains, and joins the best sentences (highest score first, earlier
/// sentence on ties) with a space. Sentences with no scored words are
/// never selected.
pub fn summarize(text: &str, num_sentences: usize) -> String {
    let text = normalize_whitespace(text);

    let mut freq: HashMap<String, usize> = HashMap::new();
    for w in words(&text).filter(|w| !is_stop_word(w)) {
        *freq.entry(w).or_insert(0) += 1;
    }

    let mut scored: Vec<(usize, usize, &str)> = sentence_spans(&text)
        .into_iter()
        .enumerate()
        .filter_map(|(position, (start, end))| {
            let sentence = &text[start..end];
            let distinct: HashSet<String> = words(sentence).collect();
            let score: usize = distinct.iter().filter_map(|w| freq.get(w)).sum();
            (score > 0).then_some((score, position, sentence))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(num_sentences)
        .map(|(_, _, s)| s)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A keyword and its L2-normalized TF-IDF weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub term: String,
    pub score: f64,
}

/// Top `top_n` keywords of `text` with their weights.
///
/// Terms are lower-cased runs of two or more alphanumeric characters,
/// excluding English stop-words. With a single document the IDF factor
/// is constant, so the ranking is by term frequency; ties are broken
/// alphabetically.
pub fn keyword_scores(text: &str, top_n: usize) -> Vec<Keyword> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for w in words(text).filter(|w| w.chars().count() >= 2 && !is_stop_word(w)) {
        *counts.entry(w).or_insert(0) += 1;
    }

    let norm = counts
        .values()
        .map(|&c| (c * c) as f64)
        .sum::<f64>()
        .sqrt();

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(term, count)| Keyword {
            term,
            score: count as f64 / norm,
        })
        .collect()
}

/// Top `top_n` keyword terms of `text`.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    keyword_scores(text, top_n)
        .into_iter()
        .map(|k| k.term)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust is a systems language. Rust gives memory safety without garbage \
                        collection. Many teams adopt Rust for safety. The weather was nice.";

    #[test]
    fn test_summary_picks_highest_scoring_sentences() {
        let summary = summarize(TEXT, 2);
        assert_eq!(
            summary,
            "Rust gives memory safety without garbage collection. Many teams adopt Rust for safety."
        );
    }

    #[test]
    fn test_summary_shorter_than_requested() {
        let summary = summarize("One sentence only.", 5);
        assert_eq!(summary, "One sentence only.");
    }

    #[test]
    fn test_summary_empty_text() {
        assert_eq!(summarize("", 5), "");
        assert_eq!(summarize("   ", 3), "");
    }

    #[test]
    fn test_summary_normalizes_whitespace() {
        let summary = summarize("Cats   purr.\n\nCats\tsleep.", 1);
        assert_eq!(summary, "Cats purr.");
    }

    #[test]
    fn test_keywords_ranked_by_frequency() {
        let kws = extract_keywords(TEXT, 3);
        assert_eq!(kws, vec!["rust", "safety", "adopt"]);
    }

    #[test]
    fn test_keywords_exclude_stop_words_and_short_tokens() {
        let kws = extract_keywords("a an the x y it is of data data", 10);
        assert_eq!(kws, vec!["data"]);
    }

    #[test]
    fn test_keyword_scores_normalized() {
        let kws = keyword_scores("alpha alpha beta", 10);
        let sum_sq: f64 = kws.iter().map(|k| k.score * k.score).sum();
        assert!((sum_sq - 1.0).abs() < 1e-9);
        assert_eq!(kws[0].term, "alpha");
    }

    #[test]
    fn test_keywords_empty() {
        assert!(extract_keywords("", 10).is_empty());
    }
}
