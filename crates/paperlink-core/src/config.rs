//! Configuration for paperlink-core
//!
//! Centralized constants plus the dataset, path, and cache-root settings.
//! Dataset settings round-trip through JSON and TOML.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InputError, Result};

/// Increment whenever feature computation changes so stale caches are ignored.
pub const FEATURIZER_VERSION: u32 = 1;

/// Default dispatch chunk size for parallel work.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Distance used for a "must not merge" constraint.
pub const LARGE_DISTANCE: f64 = 1e4;

/// Placeholder magnitude for rows that are never computed.
pub const LARGE_INTEGER: f64 = 10.0 * LARGE_DISTANCE;

/// Cluster ids ending with this suffix hold papers with no known cluster.
pub const ORPHAN_CLUSTER_KEY: &str = "orphans";

/// Environment variable overriding the feature cache root.
pub const CACHE_ROOT_ENV: &str = "PAPERLINK_CACHE";

/// Placeholder written into a fresh `path_config.json`.
pub const DATA_DIR_PLACEHOLDER: &str = "absolute path of wherever you downloaded the data to";

/// Name particles stripped from the front of first+middle names.
pub const DEFAULT_NAME_PREFIXES: &[&str] = &[
    "dr", "prof", "professor", "mr", "mrs", "ms", "miss", "sir", "de", "del", "della", "der",
    "di", "da", "dos", "du", "la", "le", "van", "von", "den", "ter", "ten", "st",
];

/// Root directory for feature caches.
///
/// `PAPERLINK_CACHE` wins; otherwise `~/.paperlink`.
pub fn cache_root() -> PathBuf {
    if let Ok(root) = std::env::var(CACHE_ROOT_ENV) {
        return PathBuf::from(root);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".paperlink")
}

/// Whether a dataset is used for training/evaluation or pure inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Inference,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "train" => Ok(Mode::Train),
            "inference" => Ok(Mode::Inference),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Unit of partition for train/val/test splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitUnit {
    Papers,
    Blocks,
    Time,
}

impl SplitUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitUnit::Papers => "papers",
            SplitUnit::Blocks => "blocks",
            SplitUnit::Time => "time",
        }
    }
}

impl fmt::Display for SplitUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "papers" => Ok(SplitUnit::Papers),
            "blocks" => Ok(SplitUnit::Blocks),
            "time" => Ok(SplitUnit::Time),
            other => Err(ConfigError::UnknownSplitUnit(other.to_string())),
        }
    }
}

/// Dataset-level settings: splitting, pair sampling, parallelism
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// `train` or `inference`; inference forces exhaustive test pairs
    pub mode: Mode,
    /// How records are partitioned into train/val/test
    pub unit_of_data_split: SplitUnit,
    /// k for the block-size k-means used by the block split
    pub num_clusters_for_block_size: usize,
    pub train_ratio: f64,
    pub val_ratio: f64,
    pub test_ratio: f64,
    /// Number of training pairs for learning the linkage function
    pub train_pairs_size: usize,
    pub val_pairs_size: usize,
    pub test_pairs_size: usize,
    /// Whether to sample pairs in a class-balanced way
    pub balanced_pair_sample: bool,
    /// Whether the test split uses every within-block pair
    pub all_test_pairs: bool,
    /// Seed for all sampling and splitting
    pub random_seed: u64,
    /// Worker threads for preprocessing and featurization
    pub n_jobs: usize,
    /// Name particles stripped during author normalization
    pub name_prefixes: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Train,
            unit_of_data_split: SplitUnit::Blocks,
            num_clusters_for_block_size: 1,
            train_ratio: 0.8,
            val_ratio: 0.1,
            test_ratio: 0.1,
            train_pairs_size: 30000,
            val_pairs_size: 5000,
            test_pairs_size: 5000,
            balanced_pair_sample: true,
            all_test_pairs: false,
            random_seed: 1111,
            n_jobs: 1,
            name_prefixes: DEFAULT_NAME_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DatasetConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, ratio) in [
            ("train_ratio", self.train_ratio),
            ("val_ratio", self.val_ratio),
            ("test_ratio", self.test_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::OutOfRange(format!(
                    "{name} must be between 0.0 and 1.0, got {ratio}"
                )));
            }
        }

        let total = self.train_ratio + self.val_ratio + self.test_ratio;
        if (total - 1.0).abs() > 1e-9 {
            return Err(ConfigError::RatiosDoNotSumToOne {
                train: self.train_ratio,
                val: self.val_ratio,
                test: self.test_ratio,
            });
        }

        if self.num_clusters_for_block_size == 0 {
            return Err(ConfigError::OutOfRange(
                "num_clusters_for_block_size must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Effective worker count (never zero)
    pub fn workers(&self) -> usize {
        self.n_jobs.max(1)
    }
}

/// Project data-root settings read from `data/path_config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub main_data_dir: PathBuf,
}

impl PathConfig {
    /// Location of the path config relative to a project root
    pub fn location(project_root: &Path) -> PathBuf {
        project_root.join("data").join("path_config.json")
    }

    /// Read `data/path_config.json` under `project_root`.
    ///
    /// An unset placeholder falls back to `<project_root>/data`. The
    /// resulting directory must exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let location = Self::location(project_root);
        let text = std::fs::read_to_string(&location).map_err(|e| InputError::Io {
            path: location.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config: PathConfig = serde_json::from_str(&text)?;

        if config.main_data_dir.as_os_str() == DATA_DIR_PLACEHOLDER {
            tracing::warn!(
                "main_data_dir is not set in {}, using data/ as default data directory",
                location.display()
            );
            config.main_data_dir = project_root.join("data");
        }

        if !config.main_data_dir.exists() {
            return Err(
                ConfigError::MissingDataDir(config.main_data_dir.display().to_string()).into(),
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ratios_must_sum_to_one() {
        let config = DatasetConfig {
            train_ratio: 0.7,
            ..DatasetConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RatiosDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = DatasetConfig {
            unit_of_data_split: SplitUnit::Time,
            random_seed: 7,
            ..DatasetConfig::default()
        };
        let json = config.to_json().unwrap();
        let parsed = DatasetConfig::from_json(&json).unwrap();
        assert_eq!(parsed.unit_of_data_split, SplitUnit::Time);
        assert_eq!(parsed.random_seed, 7);
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let parsed = DatasetConfig::from_toml("unit_of_data_split = \"papers\"\nn_jobs = 4\n")
            .unwrap();
        assert_eq!(parsed.unit_of_data_split, SplitUnit::Papers);
        assert_eq!(parsed.n_jobs, 4);
        assert_eq!(parsed.train_pairs_size, 30000);
    }

    #[test]
    fn test_unknown_split_unit() {
        assert_eq!(
            "authors".parse::<SplitUnit>(),
            Err(ConfigError::UnknownSplitUnit("authors".to_string()))
        );
        assert!("inference".parse::<Mode>().is_ok());
        assert!("serve".parse::<Mode>().is_err());
    }

    #[test]
    fn test_path_config_placeholder_falls_back() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            PathConfig::location(root.path()),
            format!("{{\"main_data_dir\": \"{}\"}}", DATA_DIR_PLACEHOLDER),
        )
        .unwrap();

        let config = PathConfig::load(root.path()).unwrap();
        assert_eq!(config.main_data_dir, data);
    }

    #[test]
    fn test_path_config_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        std::fs::write(
            PathConfig::location(root.path()),
            "{\"main_data_dir\": \"/definitely/not/here\"}",
        )
        .unwrap();

        assert!(PathConfig::load(root.path()).is_err());
    }
}
