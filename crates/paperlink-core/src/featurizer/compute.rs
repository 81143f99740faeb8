//! Per-pair feature computation
//!
//! Produces the full-width vector in [`FeatureGroup::ALL`](super::FeatureGroup::ALL)
//! order. NaN marks a feature with no information on one side.

use crate::record::{Author, Paper};
use crate::text::{
    counter_jaccard, is_pdf_source, is_publisher_source, numeral_similarity,
    special_publication_word_similarity, text_features, title_year_similarity, year_diff,
};

use super::info::full_width;

/// Years at or before this are treated as missing
const MIN_VALID_YEAR: i32 = 1700;

/// Year gaps are capped here
const MAX_YEAR_DIFF: f64 = 5.0;

/// Cap on the coauthor n-gram union
const COAUTHOR_DENOMINATOR_MAX: f64 = 5000.0;

fn bool_feature(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Whether two author lists agree on first letters
///
/// NaN if either list is empty. With `check_same_len`, lists of different
/// lengths are incompatible. With `strict_order`, the i-th authors must
/// share at least `min(2, smaller set size)` letters; otherwise every
/// author on the left needs an identical letter set somewhere on the
/// right.
pub fn compare_author_first_letters(
    authors_1: &[Author],
    authors_2: &[Author],
    check_same_len: bool,
    strict_order: bool,
) -> f64 {
    if authors_1.is_empty() || authors_2.is_empty() {
        return f64::NAN;
    }
    if check_same_len && authors_1.len() != authors_2.len() {
        return 0.0;
    }

    let compatible = if strict_order {
        authors_1.iter().zip(authors_2).all(|(a, b)| {
            let (la, lb) = (a.first_letters(), b.first_letters());
            let min_size = 2.min(la.len().min(lb.len()));
            la.intersection(lb).count() >= min_size
        })
    } else {
        authors_1.iter().all(|a| {
            authors_2
                .iter()
                .any(|b| a.first_letters() == b.first_letters())
        })
    };
    bool_feature(compatible)
}

fn valid_year(paper: &Paper) -> Option<i32> {
    paper.year().filter(|&y| y > MIN_VALID_YEAR)
}

/// Capped year gap; NaN stays NaN
fn capped_year_diff(paper_1: &Paper, paper_2: &Paper) -> f64 {
    let diff = year_diff(valid_year(paper_1), valid_year(paper_2));
    if diff.is_nan() {
        diff
    } else {
        diff.min(MAX_YEAR_DIFF)
    }
}

/// Full-width feature vector for one pair
pub fn single_pair_features(paper_1: &Paper, paper_2: &Paper) -> Vec<f64> {
    let mut features = Vec::with_capacity(full_width());

    // authors
    features.push(counter_jaccard(
        paper_1.coauthor_ngrams(),
        paper_2.coauthor_ngrams(),
        Some(COAUTHOR_DENOMINATOR_MAX),
    ));
    features.push(compare_author_first_letters(
        paper_1.authors(),
        paper_2.authors(),
        true,
        true,
    ));

    // venue
    features.push(counter_jaccard(
        paper_1.venue_ngrams(),
        paper_2.venue_ngrams(),
        None,
    ));

    // year
    features.push(capped_year_diff(paper_1, paper_2));

    // title
    let (title_1, title_2) = (paper_1.title_normalized(), paper_2.title_normalized());
    features.push(counter_jaccard(
        paper_1.title_ngrams_chars(),
        paper_2.title_ngrams_chars(),
        None,
    ));
    features.push(numeral_similarity(title_1, title_2));
    features.push(special_publication_word_similarity(title_1, title_2));
    features.push(title_year_similarity(title_1, title_2));
    features.extend(text_features(
        &title_1.replace(' ', ""),
        &title_2.replace(' ', ""),
    ));

    // abstract
    features.push(counter_jaccard(
        paper_1.abstract_ngrams_words(),
        paper_2.abstract_ngrams_words(),
        None,
    ));

    // paper quality
    features.push(
        bool_feature(paper_1.has_abstract()) + bool_feature(paper_2.has_abstract()),
    );
    features.push(
        bool_feature(!paper_1.authors().is_empty()) + bool_feature(!paper_2.authors().is_empty()),
    );
    features.push(
        bool_feature(!paper_1.venue_normalized().is_empty())
            + bool_feature(!paper_2.venue_normalized().is_empty()),
    );
    features.push(bool_feature(
        is_pdf_source(paper_1.source()) || is_pdf_source(paper_2.source()),
    ));
    let publisher_count =
        bool_feature(is_publisher_source(paper_1.source())) + bool_feature(is_publisher_source(paper_2.source()));
    features.push(publisher_count);
    features.push(if publisher_count == 2.0 {
        bool_feature(paper_1.source() == paper_2.source())
    } else {
        f64::NAN
    });

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featurizer::info::{feature_index, FeatureGroup};
    use std::collections::HashSet;

    fn author(first: &str, last: &str) -> crate::record::AuthorBuilder {
        Author::builder().first(first).last(last)
    }

    fn build(builder: crate::record::PaperBuilder) -> Paper {
        builder.build(&HashSet::new())
    }

    #[test]
    fn test_first_letters_strict() {
        let a = build(Paper::builder("a").author(Author::builder().first("Sergey").middle("P").last("Tikhonov")));
        let b = build(Paper::builder("b").author(author("Sergey", "Tikhonov")));
        let c = build(Paper::builder("c").author(author("Kim", "Lee")));
        assert_eq!(compare_author_first_letters(a.authors(), b.authors(), true, true), 1.0);
        assert_eq!(compare_author_first_letters(a.authors(), c.authors(), true, true), 0.0);
        assert!(compare_author_first_letters(a.authors(), &[], true, true).is_nan());
    }

    #[test]
    fn test_first_letters_length_and_order() {
        let ab = build(
            Paper::builder("ab")
                .author(author("Ada", "Byron"))
                .author(author("Charles", "Babbage")),
        );
        let ba = build(
            Paper::builder("ba")
                .author(author("Charles", "Babbage"))
                .author(author("Ada", "Byron")),
        );
        let a = build(Paper::builder("a").author(author("Ada", "Byron")));
        assert_eq!(compare_author_first_letters(ab.authors(), a.authors(), true, true), 0.0);
        assert_eq!(compare_author_first_letters(ab.authors(), ba.authors(), true, true), 0.0);
        assert_eq!(compare_author_first_letters(ab.authors(), ba.authors(), true, false), 1.0);
    }

    #[test]
    fn test_vector_shape_and_year() {
        let p1 = build(
            Paper::builder("1")
                .title("Graph Neural Networks")
                .year(2001)
                .source("Elsevier"),
        );
        let p2 = build(
            Paper::builder("2")
                .title("Graph Neural Networks")
                .year(2020)
                .source("Wiley"),
        );
        let features = single_pair_features(&p1, &p2);
        assert_eq!(features.len(), full_width());
        assert_eq!(features[FeatureGroup::YearDiff.offset()], 5.0);
        assert_eq!(features[feature_index("title_character_similarity").unwrap()], 1.0);
        assert_eq!(features[feature_index("source_count_publisher").unwrap()], 2.0);
        assert_eq!(features[feature_index("sources_publisher_are_same").unwrap()], 0.0);
        assert!(features[feature_index("author_names_similarity").unwrap()].is_nan());
        assert!(features[feature_index("abstract_word_similarity").unwrap()].is_nan());
    }

    #[test]
    fn test_ancient_years_are_missing() {
        let p1 = build(Paper::builder("1").year(1650));
        let p2 = build(Paper::builder("2").year(2000));
        assert!(single_pair_features(&p1, &p2)[FeatureGroup::YearDiff.offset()].is_nan());
    }
}
