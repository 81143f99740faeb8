//! Pairwise feature computation with a two-tier cache

mod cache;
mod compute;
mod engine;
mod info;

pub use cache::{clear_process_cache, feature_cache_key, CacheContents, FeatureCache};
pub use compute::{compare_author_first_letters, single_pair_features};
pub use engine::{featurize, featurize_pairs, FeatureBatch, FeaturizeOptions, Featurized};
pub use info::{all_feature_names, feature_index, full_width, FeatureGroup, FeaturizationInfo};
