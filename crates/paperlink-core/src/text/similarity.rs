//! Pairwise similarity scores over text and n-gram counters
//!
//! Every score returns NaN when one side carries no information, so the
//! downstream classifier can tell "absent" apart from "dissimilar".

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use strsim::{jaro_winkler, normalized_levenshtein};

use super::ngrams::Ngrams;

lazy_static! {
    static ref YEAR_MENTION: Regex = Regex::new(r"\b(1[7-9]\d{2}|20\d{2})\b").unwrap();
    static ref ROMAN_NUMERALS: HashSet<&'static str> = [
        "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii", "xiv",
        "xv", "xvi", "xvii", "xviii", "xix", "xx",
    ]
    .into_iter()
    .collect();
    /// Words marking commentary, errata, and other derivative publications
    static ref SPECIAL_PUBLICATION_WORDS: HashSet<&'static str> = [
        "abstract", "abstracts", "addendum", "appendix", "book", "chapter", "comment",
        "commentary", "comments", "correction", "corrigendum", "discussion", "editorial",
        "erratum", "errata", "foreword", "interview", "introduction", "letter", "letters",
        "obituary", "poster", "preface", "proceedings", "reply", "response", "retraction",
        "retracted", "review", "reviews", "summary", "supplement",
    ]
    .into_iter()
    .collect();
}

/// Multiset Jaccard similarity of two counters
///
/// NaN if either side is empty. `denominator_max` caps the union so very
/// large counters are not penalized for their size.
pub fn counter_jaccard(a: &Ngrams, b: &Ngrams, denominator_max: Option<f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::NAN;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection: u64 = small
        .iter()
        .filter_map(|(k, &v)| large.get(k).map(|&w| v.min(w) as u64))
        .sum();

    if intersection == 0 {
        return 0.0;
    }

    let total_a: u64 = a.values().map(|&v| v as u64).sum();
    let total_b: u64 = b.values().map(|&v| v as u64).sum();
    let union = (total_a + total_b - intersection) as f64;
    let denominator = match denominator_max {
        Some(max) => union.min(max),
        None => union,
    };

    (intersection as f64 / denominator).min(1.0)
}

/// Absolute difference, NaN when either side is absent
pub fn year_diff(a: Option<i32>, b: Option<i32>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() as f64,
        _ => f64::NAN,
    }
}

fn set_jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return f64::NAN;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

fn numerals(title: &str) -> HashSet<String> {
    title
        .split_whitespace()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()) || ROMAN_NUMERALS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Overlap of numerals (digits and small roman numerals) in two titles
///
/// Separates "part i" from "part ii". NaN when neither title has numerals.
pub fn numeral_similarity(title_a: &str, title_b: &str) -> f64 {
    set_jaccard(&numerals(title_a), &numerals(title_b))
}

fn special_words(title: &str) -> HashSet<String> {
    title
        .split_whitespace()
        .filter(|t| SPECIAL_PUBLICATION_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Overlap of words like "erratum", "reply", or "editorial"
pub fn special_publication_word_similarity(title_a: &str, title_b: &str) -> f64 {
    set_jaccard(&special_words(title_a), &special_words(title_b))
}

fn year_mentions(title: &str) -> HashSet<String> {
    YEAR_MENTION
        .find_iter(title)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Overlap of four-digit years mentioned in two titles
pub fn title_year_similarity(title_a: &str, title_b: &str) -> f64 {
    set_jaccard(&year_mentions(title_a), &year_mentions(title_b))
}

/// Generic string similarity functions applied to whole titles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFunction {
    Levenshtein,
    Prefix,
    LongestCommonSubstring,
    JaroWinkler,
}

impl TextFunction {
    /// All functions, in feature order
    pub const ALL: [TextFunction; 4] = [
        TextFunction::Levenshtein,
        TextFunction::Prefix,
        TextFunction::LongestCommonSubstring,
        TextFunction::JaroWinkler,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextFunction::Levenshtein => "levenshtein",
            TextFunction::Prefix => "prefix",
            TextFunction::LongestCommonSubstring => "lcs",
            TextFunction::JaroWinkler => "jaro_winkler",
        }
    }

    /// Similarity in [0, 1] for two non-empty strings
    pub fn apply(&self, a: &str, b: &str) -> f64 {
        match self {
            TextFunction::Levenshtein => normalized_levenshtein(a, b),
            TextFunction::Prefix => prefix_ratio(a, b),
            TextFunction::LongestCommonSubstring => longest_common_substring_ratio(a, b),
            TextFunction::JaroWinkler => jaro_winkler(a, b),
        }
    }
}

/// Run every [`TextFunction`] over two strings; NaN for each if either is empty
pub fn text_features(a: &str, b: &str) -> Vec<f64> {
    TextFunction::ALL
        .iter()
        .map(|f| {
            if a.is_empty() || b.is_empty() {
                f64::NAN
            } else {
                f.apply(a, b)
            }
        })
        .collect()
}

fn prefix_ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let shared = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    shared as f64 / longest as f64
}

fn longest_common_substring_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    // rolling row of suffix-match lengths
    let mut prev = vec![0usize; b.len() + 1];
    let mut best = 0;
    for i in 1..=a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                row[j] = prev[j - 1] + 1;
                best = best.max(row[j]);
            }
        }
        prev = row;
    }

    best as f64 / longest as f64
}
