//! Paper domain model
//!
//! A [`Paper`] is built once from raw fields by [`PaperBuilder::build`],
//! which precomputes every normalized string and n-gram counter the
//! featurizer reads. Papers are never mutated afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::author::{Author, AuthorBuilder};
use crate::text::{
    char_ngrams, has_alphabetic, normalize_text, normalize_venue_name, word_ngrams, Ngrams,
};

/// An immutable bibliographic record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Paper {
    id: String,

    title: String,
    title_normalized: String,
    title_ngrams_chars: Ngrams,

    abstract_text: Option<String>,
    has_abstract: bool,
    abstract_ngrams_words: Ngrams,

    venue: Option<String>,
    journal_name: Option<String>,
    venue_normalized: String,
    journal_normalized: String,
    combined_venue: String,
    venue_ngrams: Ngrams,

    authors: Vec<Author>,
    coauthor_ngrams: Ngrams,

    year: Option<i32>,
    doi: Option<String>,
    pmid: Option<String>,
    pdf_hash: Option<String>,
    source: Option<String>,
    source_id: Option<String>,
    block: Option<String>,
    corpus_paper_id: Option<String>,
}

impl Paper {
    /// Start building a paper with the given id
    pub fn builder(id: impl Into<String>) -> PaperBuilder {
        PaperBuilder {
            id: id.into(),
            ..PaperBuilder::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw title
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn title_normalized(&self) -> &str {
        &self.title_normalized
    }

    /// Character trigrams of the lowercased, space-stripped title
    pub fn title_ngrams_chars(&self) -> &Ngrams {
        &self.title_ngrams_chars
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn has_abstract(&self) -> bool {
        self.has_abstract
    }

    pub fn abstract_ngrams_words(&self) -> &Ngrams {
        &self.abstract_ngrams_words
    }

    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref()
    }

    pub fn journal_name(&self) -> Option<&str> {
        self.journal_name.as_deref()
    }

    pub fn venue_normalized(&self) -> &str {
        &self.venue_normalized
    }

    pub fn journal_normalized(&self) -> &str {
        &self.journal_normalized
    }

    /// Journal and venue merged; empty when there is no alphabetic content
    pub fn combined_venue(&self) -> &str {
        &self.combined_venue
    }

    pub fn venue_ngrams(&self) -> &Ngrams {
        &self.venue_ngrams
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Character n-grams over all author full names
    pub fn coauthor_ngrams(&self) -> &Ngrams {
        &self.coauthor_ngrams
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Lowercased DOI
    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn pmid(&self) -> Option<&str> {
        self.pmid.as_deref()
    }

    pub fn pdf_hash(&self) -> Option<&str> {
        self.pdf_hash.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn block(&self) -> Option<&str> {
        self.block.as_deref()
    }

    pub fn corpus_paper_id(&self) -> Option<&str> {
        self.corpus_paper_id.as_deref()
    }

    /// Copy of this paper's raw fields, for building a variant
    pub fn to_builder(&self) -> PaperBuilder {
        PaperBuilder {
            id: self.id.clone(),
            title: Some(self.title.clone()),
            abstract_text: self.abstract_text.clone(),
            authors: self.authors.iter().map(Author::to_builder).collect(),
            venue: self.venue.clone(),
            journal_name: self.journal_name.clone(),
            year: self.year,
            doi: self.doi.clone(),
            pmid: self.pmid.clone(),
            pdf_hash: self.pdf_hash.clone(),
            source: self.source.clone(),
            source_id: self.source_id.clone(),
            block: self.block.clone(),
            corpus_paper_id: self.corpus_paper_id.clone(),
        }
    }
}

/// Raw paper fields awaiting preprocessing
#[derive(Clone, Debug, Default)]
pub struct PaperBuilder {
    id: String,
    title: Option<String>,
    abstract_text: Option<String>,
    authors: Vec<AuthorBuilder>,
    venue: Option<String>,
    journal_name: Option<String>,
    year: Option<i32>,
    doi: Option<String>,
    pmid: Option<String>,
    pdf_hash: Option<String>,
    source: Option<String>,
    source_id: Option<String>,
    block: Option<String>,
    corpus_paper_id: Option<String>,
}

impl PaperBuilder {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    pub fn author(mut self, author: AuthorBuilder) -> Self {
        self.authors.push(author);
        self
    }

    pub fn authors(mut self, authors: Vec<AuthorBuilder>) -> Self {
        self.authors = authors;
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn journal_name(mut self, journal_name: impl Into<String>) -> Self {
        self.journal_name = Some(journal_name.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn maybe_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn pmid(mut self, pmid: impl Into<String>) -> Self {
        self.pmid = Some(pmid.into());
        self
    }

    pub fn pdf_hash(mut self, pdf_hash: impl Into<String>) -> Self {
        self.pdf_hash = Some(pdf_hash.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    pub fn corpus_paper_id(mut self, corpus_paper_id: impl Into<String>) -> Self {
        self.corpus_paper_id = Some(corpus_paper_id.into());
        self
    }

    /// Normalize every field and compute the n-gram counters
    pub fn build(self, name_prefixes: &HashSet<String>) -> Paper {
        let title = self.title.unwrap_or_default();
        let title_normalized = normalize_text(&title, false);
        let title_lower_simple = title.to_lowercase().replace(' ', "");
        let title_ngrams_chars = char_ngrams(&title_lower_simple, false, false);

        let has_abstract = self.abstract_text.as_deref().is_some_and(|a| !a.is_empty());
        let abstract_normalized = match &self.abstract_text {
            Some(a) if has_abstract => normalize_text(a, false),
            _ => String::new(),
        };
        let abstract_ngrams_words = word_ngrams(&abstract_normalized);

        let venue_normalized = normalize_venue_name(self.venue.as_deref());
        let journal_normalized = normalize_venue_name(self.journal_name.as_deref());
        let mut combined_venue = if venue_normalized != journal_normalized {
            format!("{} {}", journal_normalized, venue_normalized)
                .trim()
                .to_string()
        } else {
            venue_normalized.clone()
        };
        if !has_alphabetic(&combined_venue) {
            combined_venue.clear();
        }
        let venue_ngrams = char_ngrams(&combined_venue, false, true);

        let authors: Vec<Author> = self
            .authors
            .into_iter()
            .map(|a| a.build(name_prefixes))
            .collect();
        let all_names = authors
            .iter()
            .map(Author::full_name)
            .collect::<Vec<_>>()
            .join(" ");
        let coauthor_ngrams = char_ngrams(&all_names, true, true);

        Paper {
            id: self.id,
            title,
            title_normalized,
            title_ngrams_chars,
            abstract_text: self.abstract_text,
            has_abstract,
            abstract_ngrams_words,
            venue: self.venue,
            journal_name: self.journal_name,
            venue_normalized,
            journal_normalized,
            combined_venue,
            venue_ngrams,
            authors,
            coauthor_ngrams,
            year: self.year,
            doi: self.doi.map(|d| d.to_lowercase()),
            pmid: self.pmid,
            pdf_hash: self.pdf_hash,
            source: self.source,
            source_id: self.source_id,
            block: self.block,
            corpus_paper_id: self.corpus_paper_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_prefixes() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_build_normalizes_fields() {
        let paper = Paper::builder("p1")
            .title("Deep Learning: A Survey")
            .abstract_text("We survey deep learning.")
            .venue("Nature")
            .doi("10.1038/NATURE14539")
            .author(Author::builder().first("Yann").last("LeCun"))
            .block("deeplearning")
            .build(&no_prefixes());

        assert_eq!(paper.title_normalized(), "deep learning a survey");
        assert_eq!(paper.doi(), Some("10.1038/nature14539"));
        assert!(paper.has_abstract());
        assert!(paper.abstract_ngrams_words().contains_key("deep learning"));
        assert_eq!(paper.combined_venue(), "nature");
        assert!(paper.title_ngrams_chars().contains_key("dee"));
        assert!(paper.coauthor_ngrams().contains_key("y"));
        assert_eq!(paper.block(), Some("deeplearning"));
    }

    #[test]
    fn test_page_number_venue_is_empty() {
        let paper = Paper::builder("p1")
            .journal_name("\n   351-62\n ")
            .build(&no_prefixes());
        assert_eq!(paper.combined_venue(), "");
        assert!(paper.venue_ngrams().is_empty());
    }

    #[test]
    fn test_combined_venue_journal_first() {
        let paper = Paper::builder("p1")
            .venue("NeurIPS")
            .journal_name("Advances in Neural Information Processing Systems")
            .build(&no_prefixes());
        assert_eq!(
            paper.combined_venue(),
            "advances in neural information processing systems neurips"
        );
    }

    #[test]
    fn test_empty_abstract_is_absent() {
        let paper = Paper::builder("p1").abstract_text("").build(&no_prefixes());
        assert!(!paper.has_abstract());
        assert!(paper.abstract_ngrams_words().is_empty());
    }
}
