//! Feature layout: groups, names, index ranges, and monotone constraints

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::FEATURIZER_VERSION;
use crate::error::ConfigError;
use crate::text::TextFunction;

/// A named group of adjacent features in the full vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    AuthorSimilarity,
    VenueSimilarity,
    YearDiff,
    TitleSimilarity,
    AbstractSimilarity,
    PaperQuality,
}

impl FeatureGroup {
    /// Every group, in vector order
    pub const ALL: [FeatureGroup; 6] = [
        FeatureGroup::AuthorSimilarity,
        FeatureGroup::VenueSimilarity,
        FeatureGroup::YearDiff,
        FeatureGroup::TitleSimilarity,
        FeatureGroup::AbstractSimilarity,
        FeatureGroup::PaperQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureGroup::AuthorSimilarity => "author_similarity",
            FeatureGroup::VenueSimilarity => "venue_similarity",
            FeatureGroup::YearDiff => "year_diff",
            FeatureGroup::TitleSimilarity => "title_similarity",
            FeatureGroup::AbstractSimilarity => "abstract_similarity",
            FeatureGroup::PaperQuality => "paper_quality",
        }
    }

    /// Names of the features in this group, in vector order
    pub fn feature_names(&self) -> Vec<String> {
        match self {
            FeatureGroup::AuthorSimilarity => vec![
                "author_names_similarity".to_string(),
                "author_first_letter_compatibility".to_string(),
            ],
            FeatureGroup::VenueSimilarity => vec!["venue_similarity".to_string()],
            FeatureGroup::YearDiff => vec!["year_diff".to_string()],
            FeatureGroup::TitleSimilarity => {
                let mut names: Vec<String> = [
                    "title_character_similarity",
                    "title_numeral_similarity",
                    "title_special_publication_word_similarity",
                    "title_year_similarity",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect();
                names.extend(TextFunction::ALL.iter().map(|f| format!("title_{}", f.name())));
                names
            }
            FeatureGroup::AbstractSimilarity => vec!["abstract_word_similarity".to_string()],
            FeatureGroup::PaperQuality => vec![
                "paper_field_count_abstract".to_string(),
                "paper_field_count_authors".to_string(),
                "paper_field_count_venue".to_string(),
                "source_count_pdf".to_string(),
                "source_count_publisher".to_string(),
                "sources_publisher_are_same".to_string(),
            ],
        }
    }

    /// Number of features in this group
    pub fn width(&self) -> usize {
        match self {
            FeatureGroup::AuthorSimilarity => 2,
            FeatureGroup::VenueSimilarity => 1,
            FeatureGroup::YearDiff => 1,
            FeatureGroup::TitleSimilarity => 4 + TextFunction::ALL.len(),
            FeatureGroup::AbstractSimilarity => 1,
            FeatureGroup::PaperQuality => 6,
        }
    }

    /// Position of this group's first feature in the full vector
    pub fn offset(&self) -> usize {
        FeatureGroup::ALL
            .iter()
            .take_while(|g| *g != self)
            .map(FeatureGroup::width)
            .sum()
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset();
        start..start + self.width()
    }

    /// Monotone constraint for a gradient-boosting consumer
    ///
    /// Similarities push toward "same" (`1`), year gaps away from it (`-1`),
    /// and quality counts are unconstrained (`0`).
    pub fn monotone_constraint(&self) -> &'static str {
        match self {
            FeatureGroup::YearDiff => "-1",
            FeatureGroup::PaperQuality => "0",
            _ => "1",
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureGroup {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureGroup::ALL
            .iter()
            .find(|g| g.as_str() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownFeatureGroup(s.to_string()))
    }
}

/// Width of the full feature vector
pub fn full_width() -> usize {
    FeatureGroup::ALL.iter().map(FeatureGroup::width).sum()
}

/// Which feature groups to emit and how they are cached
///
/// Vectors are always computed and cached at full width; the active groups
/// only decide which columns reach the output.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturizationInfo {
    features_to_use: Vec<FeatureGroup>,
    excluded_for_nameless: Vec<FeatureGroup>,
    featurizer_version: u32,
    indices_to_use: Vec<usize>,
    nameless_indices_to_use: Vec<usize>,
}

impl Default for FeaturizationInfo {
    fn default() -> Self {
        Self::new(
            FeatureGroup::ALL.to_vec(),
            vec![FeatureGroup::TitleSimilarity, FeatureGroup::AbstractSimilarity],
            FEATURIZER_VERSION,
        )
    }
}

impl FeaturizationInfo {
    pub fn new(
        features_to_use: Vec<FeatureGroup>,
        excluded_for_nameless: Vec<FeatureGroup>,
        featurizer_version: u32,
    ) -> Self {
        let mut indices_to_use = Vec::new();
        let mut nameless_indices_to_use = Vec::new();
        for group in FeatureGroup::ALL {
            if !features_to_use.contains(&group) {
                continue;
            }
            indices_to_use.extend(group.range());
            if !excluded_for_nameless.contains(&group) {
                nameless_indices_to_use.extend(group.range());
            }
        }

        Self {
            features_to_use,
            excluded_for_nameless,
            featurizer_version,
            indices_to_use,
            nameless_indices_to_use,
        }
    }

    /// Build from group names such as `"title_similarity"`
    pub fn from_names<S: AsRef<str>>(
        features_to_use: &[S],
        excluded_for_nameless: &[S],
        featurizer_version: u32,
    ) -> Result<Self, ConfigError> {
        let parse = |names: &[S]| -> Result<Vec<FeatureGroup>, ConfigError> {
            names.iter().map(|n| n.as_ref().parse()).collect()
        };
        Ok(Self::new(
            parse(features_to_use)?,
            parse(excluded_for_nameless)?,
            featurizer_version,
        ))
    }

    pub fn features_to_use(&self) -> &[FeatureGroup] {
        &self.features_to_use
    }

    pub fn excluded_for_nameless(&self) -> &[FeatureGroup] {
        &self.excluded_for_nameless
    }

    pub fn featurizer_version(&self) -> u32 {
        self.featurizer_version
    }

    /// Full-vector columns emitted in the main matrix
    pub fn indices_to_use(&self) -> &[usize] {
        &self.indices_to_use
    }

    /// Full-vector columns emitted in the nameless matrix
    pub fn nameless_indices_to_use(&self) -> &[usize] {
        &self.nameless_indices_to_use
    }

    /// Number of columns in the main matrix
    pub fn number_of_features(&self) -> usize {
        self.indices_to_use.len()
    }

    fn names_for(&self, indices: &[usize]) -> Vec<String> {
        let all = all_feature_names();
        indices.iter().map(|&i| all[i].clone()).collect()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.names_for(&self.indices_to_use)
    }

    pub fn nameless_feature_names(&self) -> Vec<String> {
        self.names_for(&self.nameless_indices_to_use)
    }

    fn constraints_for(&self, nameless: bool) -> String {
        FeatureGroup::ALL
            .iter()
            .filter(|g| self.features_to_use.contains(*g))
            .filter(|g| !nameless || !self.excluded_for_nameless.contains(*g))
            .flat_map(|g| std::iter::repeat(g.monotone_constraint()).take(g.width()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-separated monotone constraints for the main matrix
    pub fn monotone_constraints(&self) -> String {
        self.constraints_for(false)
    }

    /// Comma-separated monotone constraints for the nameless matrix
    pub fn nameless_monotone_constraints(&self) -> String {
        self.constraints_for(true)
    }

    /// `<cache_root>/<dataset_name>/<featurizer_version>`
    pub fn cache_directory(&self, cache_root: &Path, dataset_name: &str) -> PathBuf {
        cache_root
            .join(dataset_name)
            .join(self.featurizer_version.to_string())
    }

    pub fn cache_file_path(&self, cache_root: &Path, dataset_name: &str) -> PathBuf {
        self.cache_directory(cache_root, dataset_name)
            .join("all_features.json")
    }
}

/// Names of every feature in the full vector
pub fn all_feature_names() -> Vec<String> {
    FeatureGroup::ALL
        .iter()
        .flat_map(|g| g.feature_names())
        .collect()
}

/// Position of a named feature in the full vector
pub fn feature_index(name: &str) -> Option<usize> {
    all_feature_names().iter().position(|n| n == name)
}
