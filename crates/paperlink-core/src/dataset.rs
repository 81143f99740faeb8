//! Dataset facade
//!
//! [`PaperDataset`] ties the record store, blocks, constraints, and ground
//! truth of one named dataset together and exposes the split and pair
//! operations the featurizer drives.

use std::collections::HashSet;
use std::sync::Arc;

use crate::blocks::{BlockIndex, Blocks};
use crate::config::{DatasetConfig, Mode, SplitUnit};
use crate::constraints::{ConstraintSet, Resolution, ResolveOptions, SeedDeclarations};
use crate::error::{ConfigError, Result};
use crate::input::{
    read_clusters, read_embeddings, read_id_lines, read_paper_list, read_pairs_csv, read_papers,
    read_seeds, Embeddings, InputSource, RawPapers,
};
use crate::record::{Paper, PaperBuilder, RecordStore};
use crate::sampling::{sample_pairs, Clusters, GroundTruth, Pair, SampleOptions};
use crate::split::{
    split_by_block, split_by_paper, split_by_time, split_fixed_pairs, split_fixed_papers,
    SplitBlocks, SplitPairs,
};

/// Externally fixed train/val/test inputs
#[derive(Debug, Clone)]
struct Fixed<T> {
    train: Option<T>,
    val: Option<T>,
    test: Option<T>,
}

impl<T> Default for Fixed<T> {
    fn default() -> Self {
        Self {
            train: None,
            val: None,
            test: None,
        }
    }
}

/// A named collection of papers plus everything needed to pair them up
#[derive(Debug)]
pub struct PaperDataset {
    name: String,
    config: DatasetConfig,
    store: Arc<RecordStore>,
    block_index: BlockIndex,
    constraints: ConstraintSet,
    clusters: Option<Clusters>,
    ground_truth: Option<GroundTruth>,
    embeddings: Option<Embeddings>,
    altered_papers: Option<Vec<String>>,
    fixed_pairs: Fixed<Vec<Pair>>,
    fixed_papers: Fixed<Vec<String>>,
}

impl PaperDataset {
    /// Start building a dataset from raw papers
    pub fn builder(name: impl Into<String>, papers: InputSource<RawPapers>) -> DatasetBuilder {
        DatasetBuilder {
            name: name.into(),
            papers: PaperInput::Raw(papers),
            config: DatasetConfig::default(),
            clusters: None,
            cluster_seeds: None,
            embeddings: None,
            altered_papers: None,
            fixed_pairs: Fixed::default(),
            fixed_papers: Fixed::default(),
        }
    }

    /// Start building a dataset from in-memory paper builders
    pub fn from_builders(name: impl Into<String>, papers: Vec<PaperBuilder>) -> DatasetBuilder {
        let mut builder = Self::builder(name, InputSource::value(Vec::new()));
        builder.papers = PaperInput::Built(papers);
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Shared handle on the record arena
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn paper(&self, paper_id: &str) -> Result<&Paper> {
        self.store.paper(paper_id)
    }

    pub fn block_index(&self) -> &BlockIndex {
        &self.block_index
    }

    /// Every block of the dataset
    pub fn blocks(&self) -> &Blocks {
        self.block_index.blocks()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn clusters(&self) -> Option<&Clusters> {
        self.clusters.as_ref()
    }

    /// Paper → cluster labels; only present in train mode with clusters
    pub fn ground_truth(&self) -> Option<&GroundTruth> {
        self.ground_truth.as_ref()
    }

    pub fn embedding(&self, paper_id: &str) -> Option<&[f32]> {
        self.embeddings
            .as_ref()
            .and_then(|e| e.get(paper_id))
            .map(Vec::as_slice)
    }

    /// Papers whose clusters changed since the seeds were declared
    pub fn altered_papers(&self) -> Option<&[String]> {
        self.altered_papers.as_deref()
    }

    pub fn has_fixed_pairs(&self) -> bool {
        self.fixed_pairs.train.is_some()
    }

    pub fn has_fixed_papers(&self) -> bool {
        self.fixed_papers.train.is_some()
    }

    /// Settle a pair by declared seeds and shared identifiers
    pub fn resolve(
        &self,
        paper_id_1: &str,
        paper_id_2: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        self.constraints
            .resolve(&self.store, paper_id_1, paper_id_2, options)
    }

    /// Constraint distance: `low` for must-merge, `high` for must-not, else `None`
    pub fn get_constraint(
        &self,
        paper_id_1: &str,
        paper_id_2: &str,
        low: f64,
        high: f64,
        options: ResolveOptions,
    ) -> Result<Option<f64>> {
        self.constraints
            .distance(&self.store, paper_id_1, paper_id_2, low, high, options)
    }

    /// Split blocks by the configured unit
    pub fn split_cluster_papers(&self) -> Result<SplitBlocks> {
        tracing::debug!("splitting by {}", self.config.unit_of_data_split);
        match self.config.unit_of_data_split {
            SplitUnit::Papers => split_by_paper(
                self.store.ids().map(str::to_string).collect(),
                &self.block_index,
                &self.config,
            ),
            SplitUnit::Blocks => split_by_block(self.blocks(), &self.config),
            SplitUnit::Time => split_by_time(&self.store, &self.block_index, &self.config),
        }
    }

    /// Split blocks by the fixed paper lists
    pub fn split_data_papers_fixed(&self) -> Result<SplitBlocks> {
        let (Some(train), Some(test)) = (&self.fixed_papers.train, &self.fixed_papers.test) else {
            return Err(ConfigError::MissingFixedPapers(
                "train and test papers are required for a fixed paper split".to_string(),
            )
            .into());
        };
        tracing::debug!("fixed papers split");
        split_fixed_papers(
            train.clone(),
            self.fixed_papers.val.clone(),
            test.clone(),
            &self.block_index,
            &self.config,
        )
    }

    fn sample(&self, blocks: &Blocks, size: usize, all_pairs: bool, balanced: bool) -> Result<Vec<Pair>> {
        sample_pairs(
            blocks,
            self.ground_truth.as_ref(),
            SampleOptions {
                size,
                all_pairs,
                balanced,
                seed: self.config.random_seed,
            },
        )
    }

    /// Draw train/val/test pairs inside each partition
    ///
    /// Test pairs are never balanced, and exhaustive when `all_test_pairs`
    /// is set.
    pub fn split_pairs(&self, split: &SplitBlocks) -> Result<SplitPairs> {
        let train = self.sample(
            &split.train,
            self.config.train_pairs_size,
            false,
            self.config.balanced_pair_sample,
        )?;
        let val = if split.val.is_empty() {
            Vec::new()
        } else {
            self.sample(
                &split.val,
                self.config.val_pairs_size,
                false,
                self.config.balanced_pair_sample,
            )?
        };
        let test = self.sample(
            &split.test,
            self.config.test_pairs_size,
            self.config.all_test_pairs,
            false,
        )?;
        tracing::debug!(
            "split pairs: {} train, {} val, {} test",
            train.len(),
            val.len(),
            test.len()
        );
        Ok(SplitPairs { train, val, test })
    }

    /// The fixed pair tables, with val carved from train when absent
    pub fn fixed_pairs(&self) -> Result<SplitPairs> {
        let (Some(train), Some(test)) = (&self.fixed_pairs.train, &self.fixed_pairs.test) else {
            return Err(ConfigError::MissingFixedPairs(
                "train and test pairs are required to use fixed pairs".to_string(),
            )
            .into());
        };
        Ok(split_fixed_pairs(
            train.clone(),
            self.fixed_pairs.val.clone(),
            test.clone(),
            &self.config,
        ))
    }

    /// Every within-block pair of the dataset
    pub fn all_pairs(&self) -> Result<Vec<Pair>> {
        self.sample(self.blocks(), 0, true, false)
    }

    /// Cluster id → papers for the papers in `blocks`
    pub fn construct_cluster_to_papers(&self, blocks: &Blocks) -> Result<Clusters> {
        match &self.ground_truth {
            Some(truth) => truth.cluster_to_papers(blocks),
            None => Err(ConfigError::MissingClusters(self.name.clone()).into()),
        }
    }
}

#[derive(Debug)]
enum PaperInput {
    Raw(InputSource<RawPapers>),
    Built(Vec<PaperBuilder>),
}

/// Collects a dataset's inputs; see [`PaperDataset::builder`]
#[derive(Debug)]
pub struct DatasetBuilder {
    name: String,
    papers: PaperInput,
    config: DatasetConfig,
    clusters: Option<InputSource<Clusters>>,
    cluster_seeds: Option<InputSource<SeedDeclarations>>,
    embeddings: Option<InputSource<Embeddings>>,
    altered_papers: Option<InputSource<Vec<String>>>,
    fixed_pairs: Fixed<InputSource<Vec<Pair>>>,
    fixed_papers: Fixed<InputSource<Vec<String>>>,
}

impl DatasetBuilder {
    pub fn config(mut self, config: DatasetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clusters(mut self, clusters: InputSource<Clusters>) -> Self {
        self.clusters = Some(clusters);
        self
    }

    pub fn cluster_seeds(mut self, seeds: InputSource<SeedDeclarations>) -> Self {
        self.cluster_seeds = Some(seeds);
        self
    }

    pub fn embeddings(mut self, embeddings: InputSource<Embeddings>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Newline-separated ids when given as a path
    pub fn altered_papers(mut self, papers: InputSource<Vec<String>>) -> Self {
        self.altered_papers = Some(papers);
        self
    }

    /// Fixed pair CSV tables; `val` may be omitted
    pub fn fixed_pairs(
        mut self,
        train: InputSource<Vec<Pair>>,
        val: Option<InputSource<Vec<Pair>>>,
        test: InputSource<Vec<Pair>>,
    ) -> Self {
        self.fixed_pairs = Fixed {
            train: Some(train),
            val,
            test: Some(test),
        };
        self
    }

    /// Fixed paper lists (JSON arrays); `val` may be omitted
    pub fn fixed_papers(
        mut self,
        train: InputSource<Vec<String>>,
        val: Option<InputSource<Vec<String>>>,
        test: InputSource<Vec<String>>,
    ) -> Self {
        self.fixed_papers = Fixed {
            train: Some(train),
            val,
            test: Some(test),
        };
        self
    }

    /// Load every input, preprocess papers, and partition them into blocks
    pub fn build(self) -> Result<PaperDataset> {
        let mut config = self.config;
        config.validate()?;
        if config.mode == Mode::Inference {
            config.all_test_pairs = true;
        }

        let builders: Vec<PaperBuilder> = match self.papers {
            PaperInput::Raw(source) => {
                tracing::debug!("loading papers");
                source
                    .load_with(read_papers)?
                    .into_iter()
                    .map(|(id, raw)| raw.into_builder(id))
                    .collect()
            }
            PaperInput::Built(builders) => builders,
        };

        let clusters = load_optional(self.clusters, read_clusters)?;
        let embeddings = load_optional(self.embeddings, read_embeddings)?;
        let seeds = load_optional(self.cluster_seeds, read_seeds)?;
        let altered_papers = load_optional(self.altered_papers, read_id_lines)?;

        let fixed_pairs = Fixed {
            train: load_optional(self.fixed_pairs.train, read_pairs_csv)?,
            val: load_optional(self.fixed_pairs.val, read_pairs_csv)?,
            test: load_optional(self.fixed_pairs.test, read_pairs_csv)?,
        };
        let fixed_papers = Fixed {
            train: load_optional(self.fixed_papers.train, read_paper_list)?,
            val: load_optional(self.fixed_papers.val, read_paper_list)?,
            test: load_optional(self.fixed_papers.test, read_paper_list)?,
        };

        let constraints = match &seeds {
            Some(seeds) => ConstraintSet::from_seeds(seeds),
            None => ConstraintSet::empty(),
        };

        let ground_truth = match (&clusters, config.mode) {
            (Some(clusters), Mode::Train) => {
                tracing::debug!("making paper to cluster id");
                Some(GroundTruth::from_clusters(clusters))
            }
            _ => None,
        };

        let name_prefixes: HashSet<String> = config.name_prefixes.iter().cloned().collect();
        let store = RecordStore::from_builders(builders, &name_prefixes, config.workers())?;
        let block_index = BlockIndex::partition(&store)?;

        tracing::info!(
            "dataset {} ready: {} papers in {} blocks",
            self.name,
            store.len(),
            block_index.len()
        );

        Ok(PaperDataset {
            name: self.name,
            config,
            store: Arc::new(store),
            block_index,
            constraints,
            clusters,
            ground_truth,
            embeddings,
            altered_papers,
            fixed_pairs,
            fixed_papers,
        })
    }
}

fn load_optional<T, F>(source: Option<InputSource<T>>, read: F) -> Result<Option<T>>
where
    F: FnOnce(&std::path::Path) -> Result<T>,
{
    source.map(|s| s.load_with(read)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::paper_count;
    use crate::sampling::PairLabel;

    fn clusters(layout: &[(&str, &[&str])]) -> Clusters {
        layout.iter()
            .map(|(k, ids)| (k.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn small_dataset(mode: Mode) -> PaperDataset {
        let papers = vec![
            Paper::builder("1").title("alpha").block("a"),
            Paper::builder("2").title("alpha").block("a"),
            Paper::builder("3").title("beta").block("a"),
            Paper::builder("4").title("gamma").block("b"),
            Paper::builder("5").title("gamma"),
        ];
        PaperDataset::from_builders("small", papers)
            .config(DatasetConfig {
                mode,
                ..DatasetConfig::default()
            })
            .clusters(InputSource::value(clusters(&[
                ("c1", &["1", "2"]),
                ("c2", &["3"]),
                ("c3_orphans", &["4", "5"]),
            ])))
            .build()
            .unwrap()
    }

    #[test]
    fn test_blocks_include_unblocked() {
        let dataset = small_dataset(Mode::Train);
        assert_eq!(dataset.blocks().len(), 3);
        assert_eq!(dataset.blocks()[""], vec!["5"]);
        assert_eq!(paper_count(dataset.blocks()), 5);
    }

    #[test]
    fn test_all_pairs_within_blocks() {
        let dataset = small_dataset(Mode::Train);
        let pairs = dataset.all_pairs().unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&Pair::new("1", "2", PairLabel::Same)));
        assert!(pairs.contains(&Pair::new("1", "3", PairLabel::Different)));
    }

    #[test]
    fn test_inference_mode_has_no_labels() {
        let dataset = small_dataset(Mode::Inference);
        assert!(dataset.ground_truth().is_none());
        assert!(dataset.config().all_test_pairs);
        assert!(dataset
            .all_pairs()
            .unwrap()
            .iter()
            .all(|p| p.label == PairLabel::Unknown));
    }

    #[test]
    fn test_fixed_pairs_required() {
        let dataset = small_dataset(Mode::Train);
        assert!(!dataset.has_fixed_pairs());
        assert!(dataset.fixed_pairs().is_err());
        assert!(dataset.split_data_papers_fixed().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = PaperDataset::from_builders("bad", vec![])
            .config(DatasetConfig {
                val_ratio: 0.5,
                ..DatasetConfig::default()
            })
            .build();
        assert!(result.is_err());
    }
}
