//! Shared tokenizing helpers: word splitting, sentence spans, stop-words.

use std::collections::HashSet;
use std::sync::OnceLock;

/// English stop-words (the NLTK list).
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub(crate) fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased alphanumeric words of `text`.
pub(crate) fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Lower-cased words that carry meaning: not stop-words, not single letters.
pub(crate) fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    words(text).filter(|w| w.chars().count() > 1 && !is_stop_word(w))
}

/// Strip a common English inflection so "parks" matches "park".
pub(crate) fn stem(word: &str) -> &str {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.chars().count() >= 3 {
                return base;
            }
        }
    }
    word
}

/// Byte ranges of the sentences in `text`, trimmed of surrounding whitespace.
///
/// A sentence ends after a run of `.`, `!` or `?` that is followed by
/// whitespace (or the end of text), or at a blank line.
pub(crate) fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '.' | '!' | '?' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if matches!(n, '.' | '!' | '?' | '"' | '\'' | ')' | '”' | '’') {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                match chars.peek() {
                    Some(&(_, n)) if n.is_whitespace() => Some(end),
                    None => Some(end),
                    _ => None,
                }
            }
            '\n' if matches!(chars.peek(), Some(&(_, '\n'))) => Some(i),
            _ => None,
        };

        if let Some(end) = boundary {
            push_trimmed(text, start, end, &mut spans);
            start = end;
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    spans.push((start + lead, start + lead + trimmed.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(text: &str) -> Vec<&str> {
        sentence_spans(text)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect()
    }

    #[test]
    fn test_sentence_spans_basic() {
        assert_eq!(
            sentences("The cat sat on the mat. The dog ran in the park."),
            vec!["The cat sat on the mat.", "The dog ran in the park."]
        );
    }

    #[test]
    fn test_sentence_spans_abbreviation_like() {
        assert_eq!(sentences("Version 1.5 shipped. Done"), vec!["Version 1.5 shipped.", "Done"]);
    }

    #[test]
    fn test_sentence_spans_blank_line() {
        assert_eq!(sentences("Title\n\nBody text!"), vec!["Title", "Body text!"]);
    }

    #[test]
    fn test_sentence_spans_quotes_and_runs() {
        assert_eq!(
            sentences("He said \"stop!\" Then left?! Ok."),
            vec!["He said \"stop!\"", "Then left?!", "Ok."]
        );
    }

    #[test]
    fn test_sentence_spans_empty() {
        assert!(sentence_spans("   ").is_empty());
    }

    #[test]
    fn test_content_words() {
        let w: Vec<String> = content_words("Where did the Cat sit?").collect();
        assert_eq!(w, vec!["cat", "sit"]);
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("parks"), "park");
        assert_eq!(stem("running"), "runn");
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("bus"), "bus");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
