//! Labeled pair enumeration and sampling
//!
//! Pairs are only ever formed inside a block. Labels come from ground-truth
//! clusters when they exist; papers in an orphan cluster carry no label.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::blocks::Blocks;
use crate::config::ORPHAN_CLUSTER_KEY;
use crate::error::{LookupError, Result};

/// Supervision label of a candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairLabel {
    /// Both papers are the same work
    Same,
    /// The papers are different works
    Different,
    /// No ground truth for this pair
    Unknown,
    /// Negative marker (k < 0) for rows that must not be featurized
    Partial(i32),
}

impl PairLabel {
    /// Numeric form for external consumers: 1, 0, NaN, or k
    pub fn to_f64(self) -> f64 {
        match self {
            PairLabel::Same => 1.0,
            PairLabel::Different => 0.0,
            PairLabel::Unknown => f64::NAN,
            PairLabel::Partial(k) => k as f64,
        }
    }

    /// Whether this pair carries a class label
    pub fn is_labeled(self) -> bool {
        matches!(self, PairLabel::Same | PairLabel::Different)
    }

    pub fn is_partial(self) -> bool {
        matches!(self, PairLabel::Partial(_))
    }
}

/// A candidate pair of paper ids with its label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub paper_id_1: String,
    pub paper_id_2: String,
    pub label: PairLabel,
}

impl Pair {
    pub fn new(
        paper_id_1: impl Into<String>,
        paper_id_2: impl Into<String>,
        label: PairLabel,
    ) -> Self {
        Self {
            paper_id_1: paper_id_1.into(),
            paper_id_2: paper_id_2.into(),
            label,
        }
    }
}

/// Cluster id → paper ids
pub type Clusters = BTreeMap<String, Vec<String>>;

/// Paper → true cluster map built from labeled clusters
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    paper_to_cluster: HashMap<String, String>,
}

impl GroundTruth {
    pub fn from_clusters(clusters: &Clusters) -> Self {
        let paper_to_cluster = clusters
            .iter()
            .flat_map(|(cluster_id, papers)| {
                papers
                    .iter()
                    .map(move |paper_id| (paper_id.clone(), cluster_id.clone()))
            })
            .collect();
        Self { paper_to_cluster }
    }

    pub fn cluster_of(&self, paper_id: &str) -> Result<&str> {
        self.paper_to_cluster
            .get(paper_id)
            .map(String::as_str)
            .ok_or_else(|| LookupError::ClusterNotFound(paper_id.to_string()).into())
    }

    pub fn len(&self) -> usize {
        self.paper_to_cluster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paper_to_cluster.is_empty()
    }

    /// Label two papers; orphans on either side give `Unknown`
    pub fn label(&self, paper_id_1: &str, paper_id_2: &str) -> Result<PairLabel> {
        let cluster_1 = self.cluster_of(paper_id_1)?;
        let cluster_2 = self.cluster_of(paper_id_2)?;
        if is_orphan_cluster(cluster_1) || is_orphan_cluster(cluster_2) {
            return Ok(PairLabel::Unknown);
        }
        Ok(if cluster_1 == cluster_2 {
            PairLabel::Same
        } else {
            PairLabel::Different
        })
    }

    /// Cluster id → papers, restricted to the papers in `blocks`
    pub fn cluster_to_papers(&self, blocks: &Blocks) -> Result<Clusters> {
        let mut out = Clusters::new();
        for paper_id in blocks.values().flatten() {
            let cluster = self.cluster_of(paper_id)?;
            out.entry(cluster.to_string())
                .or_default()
                .push(paper_id.clone());
        }
        Ok(out)
    }
}

/// Cluster ids ending in the orphan suffix hold unlabeled papers
pub fn is_orphan_cluster(cluster_id: &str) -> bool {
    cluster_id.ends_with(ORPHAN_CLUSTER_KEY)
}

/// Parameters for one [`sample_pairs`] call
#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    /// Upper bound on the number of pairs returned
    pub size: usize,
    /// Return every within-block pair, ignoring `size` and `balanced`
    pub all_pairs: bool,
    /// Draw up to `size / 2` Same and up to `size / 2` Different pairs
    pub balanced: bool,
    pub seed: u64,
}

/// Every unordered within-block pair, labeled from `ground_truth` if given
pub fn enumerate_pairs(blocks: &Blocks, ground_truth: Option<&GroundTruth>) -> Result<Vec<Pair>> {
    let mut possible = Vec::new();
    for papers in blocks.values() {
        for (i, s1) in papers.iter().enumerate() {
            for s2 in &papers[i + 1..] {
                let label = match ground_truth {
                    Some(truth) => truth.label(s1, s2)?,
                    None => PairLabel::Unknown,
                };
                possible.push(Pair::new(s1.as_str(), s2.as_str(), label));
            }
        }
    }
    Ok(possible)
}

/// Enumerate within-block pairs and sample from them
///
/// A single seeded generator drives all randomness of one call. Pairs
/// are never fabricated: the result is always a subset of the
/// enumerated pairs.
pub fn sample_pairs(
    blocks: &Blocks,
    ground_truth: Option<&GroundTruth>,
    options: SampleOptions,
) -> Result<Vec<Pair>> {
    let possible = enumerate_pairs(blocks, ground_truth)?;
    if options.all_pairs {
        return Ok(possible);
    }

    let mut rng = StdRng::seed_from_u64(options.seed);

    let pairs = if options.balanced {
        let (same, different): (Vec<Pair>, Vec<Pair>) = possible
            .into_iter()
            .filter(|p| p.label.is_labeled())
            .partition(|p| p.label == PairLabel::Same);
        let half = options.size / 2;
        let mut pairs = draw(&mut rng, same, half);
        pairs.extend(draw(&mut rng, different, half));
        pairs
    } else {
        let labeled: Vec<Pair> = possible
            .into_iter()
            .filter(|p| p.label != PairLabel::Unknown)
            .collect();
        draw(&mut rng, labeled, options.size)
    };

    tracing::debug!("sampled {} pairs from {} blocks", pairs.len(), blocks.len());
    Ok(pairs)
}

/// Uniform sample of up to `amount` items without replacement
fn draw(rng: &mut StdRng, items: Vec<Pair>, amount: usize) -> Vec<Pair> {
    let amount = amount.min(items.len());
    let mut chosen: Vec<Option<Pair>> = items.into_iter().map(Some).collect();
    sample(rng, chosen.len(), amount)
        .into_iter()
        .filter_map(|i| chosen[i].take())
        .collect()
}
