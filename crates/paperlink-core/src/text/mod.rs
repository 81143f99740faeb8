//! Text helpers consumed by the record store and the featurizer
//!
//! Pure functions from raw strings to normalized strings, n-gram counters,
//! and pairwise similarity scores. Missing values come back as NaN.

mod ngrams;
mod normalize;
mod similarity;
mod sources;

pub use ngrams::{char_ngrams, word_ngrams, Ngrams};
pub use normalize::{has_alphabetic, normalize_name_part, normalize_text, normalize_venue_name};
pub use similarity::{
    counter_jaccard, numeral_similarity, special_publication_word_similarity, text_features,
    title_year_similarity, year_diff, TextFunction,
};
pub use sources::{is_pdf_source, is_publisher_source, PDF_SOURCES, PUBLISHER_SOURCES};
