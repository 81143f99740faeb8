//! Character and word n-gram counters

use std::collections::HashMap;

/// Token → frequency map
pub type Ngrams = HashMap<String, u32>;

/// Character n-grams of `text`
///
/// Trigrams are always produced; unigrams and bigrams are optional. Grams
/// that span a space are skipped.
pub fn char_ngrams(text: &str, use_unigrams: bool, use_bigrams: bool) -> Ngrams {
    let mut counts = Ngrams::new();
    if text.is_empty() {
        return counts;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sizes = Vec::with_capacity(3);
    if use_unigrams {
        sizes.push(1);
    }
    if use_bigrams {
        sizes.push(2);
    }
    sizes.push(3);

    for n in sizes {
        for window in chars.windows(n) {
            if window.contains(&' ') {
                continue;
            }
            *counts.entry(window.iter().collect()).or_insert(0) += 1;
        }
    }

    counts
}

/// Word unigrams, bigrams, and trigrams of `text`
///
/// Single-character words are dropped before forming grams.
pub fn word_ngrams(text: &str) -> Ngrams {
    let mut counts = Ngrams::new();
    let words: Vec<&str> = text.split_whitespace().filter(|w| w.chars().count() > 1).collect();

    for n in 1..=3 {
        for window in words.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_trigrams_only() {
        let grams = char_ngrams("abcd", false, false);
        assert_eq!(grams.len(), 2);
        assert_eq!(grams.get("abc"), Some(&1));
        assert_eq!(grams.get("bcd"), Some(&1));
    }

    #[test]
    fn test_char_ngrams_skip_spaces() {
        let grams = char_ngrams("ab cd", false, true);
        assert_eq!(grams.get("ab"), Some(&1));
        assert_eq!(grams.get("cd"), Some(&1));
        assert!(grams.keys().all(|k| !k.contains(' ')));
        assert!(!grams.contains_key("b c"));
    }

    #[test]
    fn test_char_ngrams_counts_repeats() {
        let grams = char_ngrams("aaaa", true, false);
        assert_eq!(grams.get("a"), Some(&4));
        assert_eq!(grams.get("aaa"), Some(&2));
    }

    #[test]
    fn test_word_ngrams() {
        let grams = word_ngrams("deep learning a survey");
        assert_eq!(grams.get("deep"), Some(&1));
        assert_eq!(grams.get("deep learning"), Some(&1));
        assert_eq!(grams.get("deep learning survey"), Some(&1));
        assert!(!grams.contains_key("a"));
        assert!(word_ngrams("").is_empty());
    }
}
