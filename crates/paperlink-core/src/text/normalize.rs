//! Text normalization for titles, names, and venues

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref A_THROUGH_Z: Regex = Regex::new(r"[a-z]").unwrap();
    static ref APOSTROPHES: Regex = Regex::new(r"['’`ʼ]").unwrap();
    static ref DASHES: Regex = Regex::new(r"[-‐‑‒–—]").unwrap();
}

/// Normalize free text for comparison
///
/// - Unicode NFKD with combining marks removed
/// - Lowercased
/// - Non-alphanumeric characters become spaces
/// - Whitespace collapsed and trimmed
///
/// With `special_case_apostrophes_and_dashes`, apostrophes are dropped
/// (`o'brien` → `obrien`) and dashes split tokens (`jean-luc` → `jean luc`).
pub fn normalize_text(text: &str, special_case_apostrophes_and_dashes: bool) -> String {
    let mut folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    if special_case_apostrophes_and_dashes {
        folded = APOSTROPHES.replace_all(&folded, "").into_owned();
        folded = DASHES.replace_all(&folded, " ").into_owned();
    }

    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize one part of a person name
pub fn normalize_name_part(part: Option<&str>) -> String {
    part.map(|p| normalize_text(p, true)).unwrap_or_default()
}

/// Normalize a venue or journal name; absent venues become empty
pub fn normalize_venue_name(venue: Option<&str>) -> String {
    venue.map(|v| normalize_text(v, false)).unwrap_or_default()
}

/// Whether normalized text has any a-z content
///
/// Venues like `"351-62"` are page numbers, not venues.
pub fn has_alphabetic(text: &str) -> bool {
    A_THROUGH_Z.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("The Quick,  Brown Fox!", false), "the quick brown fox");
        assert_eq!(normalize_text("Études Françaises", false), "etudes francaises");
        assert_eq!(normalize_text("", false), "");
    }

    #[test]
    fn test_apostrophes_and_dashes() {
        assert_eq!(normalize_text("O'Brien", true), "obrien");
        assert_eq!(normalize_text("Jean-Luc", true), "jean luc");
        assert_eq!(normalize_text("Jean-Luc", false), "jean luc");
        assert_eq!(normalize_text("O'Brien", false), "o brien");
    }

    #[test]
    fn test_venue_name() {
        assert_eq!(normalize_venue_name(None), "");
        assert_eq!(
            normalize_venue_name(Some("J. Pharm. Biomed. Anal.")),
            "j pharm biomed anal"
        );
        assert!(!has_alphabetic(&normalize_venue_name(Some("\n  351-62\n"))));
        assert!(has_alphabetic("nature"));
    }
}
