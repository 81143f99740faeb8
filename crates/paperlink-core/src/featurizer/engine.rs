//! Batch featurization of pairs
//!
//! Cache hits are copied straight into the output matrix. Misses are
//! computed (in parallel for large batches), written back by row index,
//! and added to the cache before it is flushed.

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, Axis};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::cache::FeatureCache;
use super::compute::single_pair_features;
use super::info::{feature_index, full_width, FeaturizationInfo};
use crate::config::{cache_root, Mode, DEFAULT_CHUNK_SIZE, LARGE_INTEGER};
use crate::dataset::PaperDataset;
use crate::error::Result;
use crate::record::RecordStore;
use crate::sampling::{Pair, PairLabel};
use crate::split::SplitPairs;

/// Below this many misses, computation stays on the calling thread
#[cfg(feature = "parallel")]
const PARALLEL_MIN_MISSES: usize = 1000;

/// Training rows labeled Different above this coauthor similarity are dropped
const DELETE_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Options for one featurization pass
#[derive(Debug, Clone)]
pub struct FeaturizeOptions {
    /// Worker threads for cache misses
    pub n_jobs: usize,
    /// Read and write the feature cache
    pub use_cache: bool,
    /// Upper bound on pairs per dispatched chunk
    pub chunk_size: usize,
    /// Replacement for NaN in the output matrices
    pub nan_value: f64,
    /// Also emit the nameless matrix
    pub nameless: bool,
    /// Drop Different rows with near-identical coauthors
    pub delete_training_data: bool,
    /// Cache root; `None` uses [`cache_root`]
    pub cache_root: Option<PathBuf>,
}

impl Default for FeaturizeOptions {
    fn default() -> Self {
        Self {
            n_jobs: 1,
            use_cache: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            nan_value: f64::NAN,
            nameless: false,
            delete_training_data: false,
            cache_root: None,
        }
    }
}

/// Feature rows with their labels
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    /// One row per pair, columns per `indices_to_use`
    pub features: Array2<f64>,
    pub labels: Vec<PairLabel>,
    /// Same rows, columns per `nameless_indices_to_use`
    pub nameless_features: Option<Array2<f64>>,
}

impl FeatureBatch {
    /// Labels as floats for an external consumer
    pub fn labels_f64(&self) -> Vec<f64> {
        self.labels.iter().map(|l| l.to_f64()).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Output of [`featurize`]
#[derive(Debug, Clone)]
pub enum Featurized {
    Inference(FeatureBatch),
    Train {
        train: FeatureBatch,
        val: FeatureBatch,
        test: FeatureBatch,
    },
}

/// Turn pairs into feature matrices
///
/// Rows of partially supervised pairs are never computed and stay at
/// `-LARGE_INTEGER`.
pub fn featurize_pairs(
    pairs: &[Pair],
    dataset: &PaperDataset,
    info: &FeaturizationInfo,
    options: &FeaturizeOptions,
) -> Result<FeatureBatch> {
    let mut full = Array2::from_elem((pairs.len(), full_width()), -LARGE_INTEGER);

    let mut cache = if options.use_cache {
        let root = options.cache_root.clone().unwrap_or_else(cache_root);
        Some(FeatureCache::open(&root, dataset.name(), info)?)
    } else {
        None
    };

    let mut misses: Vec<(usize, &Pair)> = Vec::new();
    let mut hits = 0usize;
    for (row, pair) in pairs.iter().enumerate() {
        if pair.label.is_partial() {
            continue;
        }
        match cache
            .as_ref()
            .and_then(|c| c.get(&pair.paper_id_1, &pair.paper_id_2))
        {
            Some(cached) => {
                full.row_mut(row).assign(&ArrayView1::from(cached));
                hits += 1;
            }
            None => misses.push((row, pair)),
        }
    }
    tracing::debug!("{} cache hits, {} pairs to compute", hits, misses.len());

    let computed = compute_misses(dataset.store(), &misses, options)?;
    for (row, vector) in computed {
        full.row_mut(row).assign(&ArrayView1::from(&vector[..]));
        if let Some(cache) = cache.as_mut() {
            let pair = &pairs[row];
            cache.insert(&pair.paper_id_1, &pair.paper_id_2, vector);
        }
    }

    if let Some(cache) = cache {
        cache.flush()?;
    }

    let mut labels: Vec<PairLabel> = pairs.iter().map(|p| p.label).collect();

    if options.delete_training_data {
        let column = feature_index("author_names_similarity").unwrap_or(0);
        let keep: Vec<usize> = (0..labels.len())
            .filter(|&row| {
                !(labels[row] == PairLabel::Different
                    && full[[row, column]] > DELETE_SIMILARITY_THRESHOLD)
            })
            .collect();
        tracing::info!(
            "removing {} Different pairs with near-identical coauthors",
            labels.len() - keep.len()
        );
        full = full.select(Axis(0), &keep);
        labels = keep.iter().map(|&row| labels[row]).collect();
    }

    let features = select_columns(&full, info.indices_to_use(), options.nan_value);
    let nameless_features = options
        .nameless
        .then(|| select_columns(&full, info.nameless_indices_to_use(), options.nan_value));

    Ok(FeatureBatch {
        features,
        labels,
        nameless_features,
    })
}

fn select_columns(full: &Array2<f64>, indices: &[usize], nan_value: f64) -> Array2<f64> {
    let mut selected = full.select(Axis(1), indices);
    if !nan_value.is_nan() {
        selected.mapv_inplace(|v| if v.is_nan() { nan_value } else { v });
    }
    selected
}

fn compute_chunk(store: &RecordStore, chunk: &[(usize, &Pair)]) -> Result<Vec<(usize, Vec<f64>)>> {
    chunk
        .iter()
        .map(|(row, pair)| {
            let paper_1 = store.paper(&pair.paper_id_1)?;
            let paper_2 = store.paper(&pair.paper_id_2)?;
            Ok((*row, single_pair_features(paper_1, paper_2)))
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn compute_misses(
    store: &Arc<RecordStore>,
    misses: &[(usize, &Pair)],
    options: &FeaturizeOptions,
) -> Result<Vec<(usize, Vec<f64>)>> {
    let n_jobs = options.n_jobs.max(1);
    if n_jobs <= 1 || misses.len() <= PARALLEL_MIN_MISSES {
        return compute_chunk(store, misses);
    }

    let chunk_size = options
        .chunk_size
        .min((misses.len() / n_jobs / 2).max(1))
        .max(1);
    tracing::debug!(
        "computing {} pairs on {} workers in chunks of {}",
        misses.len(),
        n_jobs,
        chunk_size
    );
    let store = Arc::clone(store);
    let chunks: Vec<Vec<(usize, Vec<f64>)>> = crate::pool::install(n_jobs, || {
        misses
            .par_chunks(chunk_size)
            .map(|chunk| compute_chunk(&store, chunk))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(chunks.into_iter().flatten().collect())
}

#[cfg(not(feature = "parallel"))]
fn compute_misses(
    store: &Arc<RecordStore>,
    misses: &[(usize, &Pair)],
    _options: &FeaturizeOptions,
) -> Result<Vec<(usize, Vec<f64>)>> {
    compute_chunk(store, misses)
}

/// Featurize a whole dataset
///
/// Inference datasets featurize every within-block pair. Training
/// datasets use fixed pairs if given, else fixed papers, else the
/// configured split unit. Only the train batch is filtered by
/// `delete_training_data`.
pub fn featurize(
    dataset: &PaperDataset,
    info: &FeaturizationInfo,
    options: &FeaturizeOptions,
) -> Result<Featurized> {
    if dataset.mode() == Mode::Inference {
        tracing::info!("featurizing all pairs of {}", dataset.name());
        let pairs = dataset.all_pairs()?;
        let options = FeaturizeOptions {
            delete_training_data: false,
            ..options.clone()
        };
        return Ok(Featurized::Inference(featurize_pairs(
            &pairs, dataset, info, &options,
        )?));
    }

    let SplitPairs { train, val, test } = if dataset.has_fixed_pairs() {
        dataset.fixed_pairs()?
    } else {
        let blocks = if dataset.has_fixed_papers() {
            dataset.split_data_papers_fixed()?
        } else {
            dataset.split_cluster_papers()?
        };
        dataset.split_pairs(&blocks)?
    };

    tracing::info!("featurizing train");
    let train = featurize_pairs(&train, dataset, info, options)?;
    let eval_options = FeaturizeOptions {
        delete_training_data: false,
        ..options.clone()
    };
    tracing::info!("featurizing val");
    let val = featurize_pairs(&val, dataset, info, &eval_options)?;
    tracing::info!("featurizing test");
    let test = featurize_pairs(&test, dataset, info, &eval_options)?;

    Ok(Featurized::Train { train, val, test })
}
