//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use paperlink_core::{DatasetConfig, InputSource, Paper, PaperBuilder, PaperDataset};

/// Path to a file under `test_fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// The fixture dataset with clusters and seeds, loaded from disk
pub fn fixture_dataset(name: &str, config: DatasetConfig) -> PaperDataset {
    PaperDataset::builder(name, InputSource::path(fixture_path("papers.json")))
        .clusters(InputSource::path(fixture_path("clusters.json")))
        .cluster_seeds(InputSource::path(fixture_path("cluster_seeds.json")))
        .config(config)
        .build()
        .unwrap_or_else(|e| panic!("failed to load fixture dataset: {e}"))
}

/// `n` papers in blocks of `block_size`, each paper its own cluster
/// except consecutive pairs, with years cycling over a decade
pub fn synthetic_builders(n: usize, block_size: usize) -> Vec<PaperBuilder> {
    (0..n)
        .map(|i| {
            Paper::builder(format!("p{i:04}"))
                .title(format!("Synthetic paper number {}", i / 2))
                .year(2000 + (i % 10) as i32)
                .block(format!("block{}", i / block_size))
        })
        .collect()
}

/// Clusters pairing papers 2k and 2k+1
pub fn synthetic_clusters(n: usize) -> paperlink_core::sampling::Clusters {
    (0..n)
        .map(|i| (format!("c{}", i / 2), format!("p{i:04}")))
        .fold(Default::default(), |mut clusters: paperlink_core::sampling::Clusters, (c, p)| {
            clusters.entry(c).or_default().push(p);
            clusters
        })
}

pub fn synthetic_dataset(name: &str, n: usize, block_size: usize, config: DatasetConfig) -> PaperDataset {
    PaperDataset::from_builders(name, synthetic_builders(n, block_size))
        .clusters(InputSource::value(synthetic_clusters(n)))
        .config(config)
        .build()
        .unwrap_or_else(|e| panic!("failed to build synthetic dataset: {e}"))
}

/// A fresh cache root for one test
pub fn cache_root() -> tempfile::TempDir {
    tempfile::tempdir().unwrap_or_else(|e| panic!("no temp dir: {e}"))
}
