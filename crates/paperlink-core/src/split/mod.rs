//! Train/validation/test splitting
//!
//! Splits never let a pair straddle two partitions: papers are divided
//! first and pairs are drawn afterwards inside each partition. Every split
//! is driven by a single seeded generator.

mod kmeans;

pub use kmeans::kmeans_1d;

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::blocks::{BlockIndex, Blocks};
use crate::config::DatasetConfig;
use crate::error::Result;
use crate::record::RecordStore;
use crate::sampling::Pair;

/// Blocks assigned to each partition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitBlocks {
    pub train: Blocks,
    pub val: Blocks,
    pub test: Blocks,
}

/// Pairs assigned to each partition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitPairs {
    pub train: Vec<Pair>,
    pub val: Vec<Pair>,
    pub test: Vec<Pair>,
}

/// `numerator / denominator`, or 0 when the denominator is 0
fn fraction(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Number of items sent to the test side: `ceil(fraction * n)`
fn test_count(fraction: f64, n: usize) -> usize {
    let raw = fraction * n as f64 - 1e-9;
    (raw.ceil().max(0.0) as usize).min(n)
}

/// Seeded shuffle, then the first `ceil(test_fraction * n)` go to test
fn shuffle_split<T>(mut items: Vec<T>, test_fraction: f64, rng: &mut StdRng) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);
    let n_test = test_count(test_fraction, items.len());
    let train = items.split_off(n_test);
    (train, items)
}

/// Stratified version of [`shuffle_split`]
///
/// The test total is `ceil(test_fraction * n)`, shared between strata in
/// proportion to their size with leftovers going to the largest
/// remainders.
fn stratified_split<T>(
    items: Vec<T>,
    strata: &[usize],
    test_fraction: f64,
    rng: &mut StdRng,
) -> (Vec<(T, usize)>, Vec<(T, usize)>) {
    let n = items.len();
    let n_test = test_count(test_fraction, n);

    let mut by_stratum: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    for (item, &stratum) in items.into_iter().zip(strata) {
        by_stratum.entry(stratum).or_default().push(item);
    }

    let mut quotas: Vec<(usize, usize, f64)> = by_stratum
        .iter()
        .map(|(&stratum, members)| {
            let exact = n_test as f64 * members.len() as f64 / n.max(1) as f64;
            (stratum, exact.floor() as usize, exact - exact.floor())
        })
        .collect();
    let assigned: usize = quotas.iter().map(|(_, q, _)| q).sum();
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| quotas[b].2.total_cmp(&quotas[a].2).then(a.cmp(&b)));
    for &i in order.iter().take(n_test.saturating_sub(assigned)) {
        quotas[i].1 += 1;
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (stratum, quota, _) in quotas {
        let mut members = by_stratum.remove(&stratum).unwrap_or_default();
        members.shuffle(rng);
        let quota = quota.min(members.len());
        let rest = members.split_off(quota);
        test.extend(members.into_iter().map(|m| (m, stratum)));
        train.extend(rest.into_iter().map(|m| (m, stratum)));
    }
    (train, test)
}

/// Split individual papers, then regroup each part into blocks
pub fn split_by_paper(
    paper_ids: Vec<String>,
    index: &BlockIndex,
    config: &DatasetConfig,
) -> Result<SplitBlocks> {
    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let val_test = config.val_ratio + config.test_ratio;

    let (train, val_test_papers) = shuffle_split(paper_ids, val_test, &mut rng);
    let (val, test) = shuffle_split(
        val_test_papers,
        fraction(config.test_ratio, val_test),
        &mut rng,
    );

    Ok(SplitBlocks {
        train: index.group_papers(&train)?,
        val: index.group_papers(&val)?,
        test: index.group_papers(&test)?,
    })
}

/// Split whole blocks, stratified by a k-means over block sizes
pub fn split_by_block(blocks: &Blocks, config: &DatasetConfig) -> Result<SplitBlocks> {
    let keys: Vec<String> = blocks.keys().cloned().collect();
    let sizes: Vec<f64> = blocks.values().map(|p| p.len() as f64).collect();
    let strata = kmeans_1d(&sizes, config.num_clusters_for_block_size);

    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let val_test = config.val_ratio + config.test_ratio;

    let (train, val_test_blocks) = stratified_split(keys, &strata, val_test, &mut rng);
    let (val_test_keys, val_test_strata): (Vec<String>, Vec<usize>) =
        val_test_blocks.into_iter().unzip();
    let (val, test) = stratified_split(
        val_test_keys,
        &val_test_strata,
        fraction(config.test_ratio, val_test),
        &mut rng,
    );

    let pick = |part: Vec<(String, usize)>| -> Blocks {
        part.into_iter()
            .filter_map(|(key, _)| blocks.get(&key).map(|papers| (key, papers.clone())))
            .collect()
    };

    Ok(SplitBlocks {
        train: pick(train),
        val: pick(val),
        test: pick(test),
    })
}

/// Oldest papers to train, then val, then the newest to test
///
/// Missing years sort as 0; ties are broken by paper id.
pub fn split_by_time(
    store: &RecordStore,
    index: &BlockIndex,
    config: &DatasetConfig,
) -> Result<SplitBlocks> {
    let mut by_year: Vec<(i32, &str)> = store
        .iter()
        .map(|p| (p.year().unwrap_or(0), p.id()))
        .collect();
    by_year.sort();

    let n = by_year.len();
    let train_size = (n as f64 * config.train_ratio + 1e-9).floor() as usize;
    let val_size = (n as f64 * config.val_ratio + 1e-9).floor() as usize;
    let train_end = train_size.min(n);
    let val_end = (train_size + val_size).min(n);

    let ids: Vec<&str> = by_year.into_iter().map(|(_, id)| id).collect();
    Ok(SplitBlocks {
        train: index.group_papers(&ids[..train_end])?,
        val: index.group_papers(&ids[train_end..val_end])?,
        test: index.group_papers(&ids[val_end..])?,
    })
}

/// Seeded Bernoulli split: each item stays in train with probability
/// `train_ratio / (train_ratio + val_ratio)`
fn bernoulli_split<T>(items: Vec<T>, config: &DatasetConfig) -> (Vec<T>, Vec<T>) {
    let train_prob = if config.train_ratio + config.val_ratio > 0.0 {
        config.train_ratio / (config.train_ratio + config.val_ratio)
    } else {
        1.0
    };
    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let mut train = Vec::new();
    let mut val = Vec::new();
    for item in items {
        if rng.random::<f64>() < train_prob {
            train.push(item);
        } else {
            val.push(item);
        }
    }
    (train, val)
}

/// Use externally fixed paper lists
///
/// Without a val list, val papers are carved out of the train list.
pub fn split_fixed_papers(
    train_papers: Vec<String>,
    val_papers: Option<Vec<String>>,
    test_papers: Vec<String>,
    index: &BlockIndex,
    config: &DatasetConfig,
) -> Result<SplitBlocks> {
    let (train, val) = match val_papers {
        Some(val) => (train_papers, val),
        None => {
            let (train, val) = bernoulli_split(train_papers, config);
            tracing::debug!("size of papers ({}, {})", train.len(), val.len());
            (train, val)
        }
    };

    Ok(SplitBlocks {
        train: index.group_papers(&train)?,
        val: index.group_papers(&val)?,
        test: index.group_papers(&test_papers)?,
    })
}

/// Use externally fixed pair tables
///
/// Without a val table, val pairs are carved out of the train table.
pub fn split_fixed_pairs(
    train_pairs: Vec<Pair>,
    val_pairs: Option<Vec<Pair>>,
    test_pairs: Vec<Pair>,
    config: &DatasetConfig,
) -> SplitPairs {
    let (train, val) = match val_pairs {
        Some(val) => (train_pairs, val),
        None => bernoulli_split(train_pairs, config),
    };
    SplitPairs {
        train,
        val,
        test: test_pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::paper_count;

    fn index_of(n: usize, block_size: usize) -> BlockIndex {
        BlockIndex::from_assignments(
            (0..n).map(|i| (format!("b{:03}", i / block_size), format!("p{i:03}"))),
        )
        .unwrap()
    }

    #[test]
    fn test_test_count_rounds_up() {
        assert_eq!(test_count(0.2, 10), 2);
        assert_eq!(test_count(0.25, 10), 3);
        assert_eq!(test_count(0.0, 10), 0);
        assert_eq!(test_count(1.0, 10), 10);
    }

    #[test]
    fn test_split_by_paper_partitions_everything() {
        let index = index_of(50, 5);
        let ids: Vec<String> = (0..50).map(|i| format!("p{i:03}")).collect();
        let config = DatasetConfig::default();
        let split = split_by_paper(ids, &index, &config).unwrap();
        assert_eq!(paper_count(&split.train), 40);
        assert_eq!(paper_count(&split.val), 5);
        assert_eq!(paper_count(&split.test), 5);
    }

    #[test]
    fn test_split_by_block_keeps_blocks_whole() {
        let index = index_of(60, 3);
        let config = DatasetConfig {
            num_clusters_for_block_size: 2,
            ..DatasetConfig::default()
        };
        let split = split_by_block(index.blocks(), &config).unwrap();
        assert_eq!(split.train.len() + split.val.len() + split.test.len(), 20);
        assert_eq!(split.train.len(), 16);
        for (key, papers) in split.train.iter().chain(&split.val).chain(&split.test) {
            assert_eq!(papers, &index.blocks()[key]);
        }
        let again = split_by_block(index.blocks(), &config).unwrap();
        assert_eq!(split, again);
    }

    #[test]
    fn test_stratified_split_respects_strata() {
        let items: Vec<usize> = (0..20).collect();
        let strata: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let (train, test) = stratified_split(items, &strata, 0.2, &mut rng);
        assert_eq!(test.len(), 4);
        assert_eq!(train.len(), 16);
        assert_eq!(test.iter().filter(|(_, s)| *s == 0).count(), 2);
    }

    #[test]
    fn test_fixed_papers_without_val() {
        let index = index_of(100, 10);
        let train: Vec<String> = (0..80).map(|i| format!("p{i:03}")).collect();
        let test: Vec<String> = (80..100).map(|i| format!("p{i:03}")).collect();
        let config = DatasetConfig::default();
        let split = split_fixed_papers(train, None, test, &index, &config).unwrap();
        assert_eq!(paper_count(&split.train) + paper_count(&split.val), 80);
        assert_eq!(paper_count(&split.test), 20);
        assert!(paper_count(&split.val) > 0);
    }
}
