//! Author representation

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::text::normalize_name_part;

/// An author of a paper, with normalized name parts derived at build time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Author {
    first: Option<String>,
    middle: Option<String>,
    last: Option<String>,
    suffix: Option<String>,
    affiliations: Vec<String>,
    email: Option<String>,

    first_normalized: String,
    middle_normalized: String,
    last_normalized: String,
    suffix_normalized: String,
    full_name: String,
    first_letters: BTreeSet<char>,
}

impl Author {
    /// Start building an author from raw name parts
    pub fn builder() -> AuthorBuilder {
        AuthorBuilder::default()
    }

    pub fn first(&self) -> Option<&str> {
        self.first.as_deref()
    }

    pub fn middle(&self) -> Option<&str> {
        self.middle.as_deref()
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn affiliations(&self) -> &[String] {
        &self.affiliations
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// First given-name token after prefix stripping
    pub fn first_normalized(&self) -> &str {
        &self.first_normalized
    }

    /// Remaining given-name tokens after prefix stripping
    pub fn middle_normalized(&self) -> &str {
        &self.middle_normalized
    }

    pub fn last_normalized(&self) -> &str {
        &self.last_normalized
    }

    pub fn suffix_normalized(&self) -> &str {
        &self.suffix_normalized
    }

    /// Normalized "first middle last suffix", empty parts skipped
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// First letters of the given-name tokens and the last name
    pub fn first_letters(&self) -> &BTreeSet<char> {
        &self.first_letters
    }

    /// Copy of this author's raw parts, for building a variant
    pub fn to_builder(&self) -> AuthorBuilder {
        AuthorBuilder {
            first: self.first.clone(),
            middle: self.middle.clone(),
            last: self.last.clone(),
            suffix: self.suffix.clone(),
            affiliations: self.affiliations.clone(),
            email: self.email.clone(),
        }
    }
}

/// Raw author name parts awaiting normalization
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthorBuilder {
    first: Option<String>,
    middle: Option<String>,
    last: Option<String>,
    suffix: Option<String>,
    affiliations: Vec<String>,
    email: Option<String>,
}

impl AuthorBuilder {
    pub fn first(mut self, first: impl Into<String>) -> Self {
        self.first = Some(first.into());
        self
    }

    /// Middle names; multiple parts are joined with spaces
    pub fn middle(mut self, middle: impl Into<String>) -> Self {
        self.middle = Some(middle.into());
        self
    }

    pub fn last(mut self, last: impl Into<String>) -> Self {
        self.last = Some(last.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn affiliations(mut self, affiliations: Vec<String>) -> Self {
        self.affiliations = affiliations;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Normalize the name parts and derive the full name and first letters
    ///
    /// First and middle are normalized separately, joined, and a leading
    /// token found in `name_prefixes` is dropped when another token follows.
    pub fn build(self, name_prefixes: &HashSet<String>) -> Author {
        let first_normed = normalize_name_part(self.first.as_deref());
        let middle_normed = normalize_name_part(self.middle.as_deref());
        let last_normalized = normalize_name_part(self.last.as_deref());
        let suffix_normalized = normalize_name_part(self.suffix.as_deref());

        let mut given: Vec<&str> = first_normed
            .split_whitespace()
            .chain(middle_normed.split_whitespace())
            .collect();
        if given.len() > 1 && name_prefixes.contains(given[0]) {
            given.remove(0);
        }

        let first_normalized = given.first().map(|s| s.to_string()).unwrap_or_default();
        let middle_normalized = given.iter().skip(1).copied().collect::<Vec<_>>().join(" ");

        let mut first_letters: BTreeSet<char> =
            given.iter().filter_map(|t| t.chars().next()).collect();
        if let Some(c) = last_normalized.chars().next() {
            first_letters.insert(c);
        }

        let full_name = [
            first_normalized.as_str(),
            middle_normalized.as_str(),
            last_normalized.as_str(),
            suffix_normalized.as_str(),
        ]
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

        Author {
            first: self.first,
            middle: self.middle,
            last: self.last,
            suffix: self.suffix,
            affiliations: self.affiliations,
            email: self.email,
            first_normalized,
            middle_normalized,
            last_normalized,
            suffix_normalized,
            full_name,
            first_letters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> HashSet<String> {
        ["de", "van"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_name_and_letters() {
        let author = Author::builder()
            .first("James")
            .middle("K.")
            .last("Drennen")
            .build(&prefixes());
        assert_eq!(author.full_name(), "james k drennen");
        assert_eq!(author.first_normalized(), "james");
        assert_eq!(author.middle_normalized(), "k");
        assert_eq!(
            author.first_letters().iter().collect::<String>(),
            "djk"
        );
    }

    #[test]
    fn test_prefix_is_stripped() {
        let author = Author::builder()
            .first("van")
            .middle("Ludwig")
            .last("Beethoven")
            .build(&prefixes());
        assert_eq!(author.first_normalized(), "ludwig");
        assert_eq!(author.middle_normalized(), "");
        assert!(!author.first_letters().contains(&'v'));
        assert!(author.first_letters().contains(&'l'));
        assert!(author.first_letters().contains(&'b'));
    }

    #[test]
    fn test_lone_prefix_is_kept() {
        let author = Author::builder().first("De").last("Smith").build(&prefixes());
        assert_eq!(author.first_normalized(), "de");
        assert!(author.first_letters().contains(&'d'));
    }

    #[test]
    fn test_hyphenated_given_name() {
        let author = Author::builder()
            .first("Jean-Luc")
            .last("Picard")
            .build(&prefixes());
        assert_eq!(author.first_normalized(), "jean");
        assert_eq!(author.middle_normalized(), "luc");
        assert_eq!(author.first_letters().len(), 3);
    }

    #[test]
    fn test_empty_author() {
        let author = Author::builder().build(&prefixes());
        assert_eq!(author.full_name(), "");
        assert!(author.first_letters().is_empty());
    }

    #[test]
    fn test_to_builder_round_trip() {
        let author = Author::builder()
            .first("Ada")
            .last("Lovelace")
            .email("ada@example.org")
            .build(&prefixes());
        let rebuilt = author.to_builder().build(&prefixes());
        assert_eq!(author, rebuilt);
    }
}
