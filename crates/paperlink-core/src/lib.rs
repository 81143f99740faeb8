//! paperlink-core - Pairwise paper matching for deduplication
//!
//! Decides, for any two candidate bibliographic records, whether a
//! deterministic rule already settles their relationship, and otherwise
//! produces a cached feature vector for a downstream classifier.
//!
//! # Key Components
//!
//! - **Record store**: immutable papers and authors built once per dataset
//! - **Constraints**: declared seeds plus shared identifiers settle pairs outright
//! - **Blocks**: the only scope in which pairs are formed
//! - **Sampling and splits**: seeded, leak-free train/val/test pairs
//! - **Featurizer**: full-width vectors, two-tier cache, bounded worker pool
//!
//! # Example
//!
//! ```no_run
//! use paperlink_core::{featurize, FeaturizationInfo, FeaturizeOptions, InputSource, PaperDataset};
//!
//! let dataset = PaperDataset::builder("arxiv", InputSource::path("arxiv_papers.json"))
//!     .clusters(InputSource::path("arxiv_clusters.json"))
//!     .build()?;
//! let batches = featurize(&dataset, &FeaturizationInfo::default(), &FeaturizeOptions::default())?;
//! # Ok::<(), paperlink_core::PaperlinkError>(())
//! ```

pub mod blocks;
pub mod config;
pub mod constraints;
pub mod dataset;
pub mod error;
pub mod featurizer;
pub mod input;
pub mod record;
pub mod sampling;
pub mod split;
pub mod text;

#[cfg(feature = "parallel")]
mod pool;

pub use blocks::{BlockIndex, Blocks, UNBLOCKED};
pub use config::{DatasetConfig, Mode, PathConfig, SplitUnit};
pub use constraints::{ConstraintSet, Resolution, ResolveOptions, SeedDeclarations, SeedKind};
pub use dataset::{DatasetBuilder, PaperDataset};
pub use error::{CacheError, ConfigError, InputError, LookupError, PaperlinkError, Result};
pub use featurizer::{
    featurize, featurize_pairs, FeatureBatch, FeatureCache, FeatureGroup, FeaturizationInfo,
    FeaturizeOptions, Featurized,
};
pub use input::InputSource;
pub use record::{Author, AuthorBuilder, Paper, PaperBuilder, RecordStore};
pub use sampling::{GroundTruth, Pair, PairLabel, SampleOptions};
pub use split::{SplitBlocks, SplitPairs};
