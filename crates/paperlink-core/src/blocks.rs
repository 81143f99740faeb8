//! Block partitioning
//!
//! A block is the only scope in which candidate pairs are formed. Every
//! paper belongs to exactly one block; papers without a block key share
//! the reserved empty-string block.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ConfigError, LookupError, Result};
use crate::record::RecordStore;

/// Block key → paper ids, ordered by block key
pub type Blocks = BTreeMap<String, Vec<String>>;

/// Block key used for papers that carry none
pub const UNBLOCKED: &str = "";

/// Blocks of a dataset plus the reverse paper → block map
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    blocks: Blocks,
    paper_to_block: HashMap<String, String>,
}

impl BlockIndex {
    /// Group every paper in `store` by its block key, in store order
    pub fn partition(store: &RecordStore) -> Result<Self> {
        let index = Self::from_assignments(store.iter().map(|paper| {
            (
                paper.block().unwrap_or(UNBLOCKED).to_string(),
                paper.id().to_string(),
            )
        }))?;
        tracing::debug!(
            "partitioned {} papers into {} blocks",
            index.paper_to_block.len(),
            index.blocks.len()
        );
        Ok(index)
    }

    /// Build from explicit `(block_key, paper_id)` assignments
    ///
    /// A paper assigned to two different blocks is a configuration error.
    pub fn from_assignments<I>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut blocks = Blocks::new();
        let mut paper_to_block: HashMap<String, String> = HashMap::new();

        for (block_key, paper_id) in assignments {
            if let Some(existing) = paper_to_block.get(&paper_id) {
                if existing != &block_key {
                    return Err(ConfigError::PaperInMultipleBlocks {
                        paper_id,
                        first: existing.clone(),
                        second: block_key,
                    }
                    .into());
                }
                continue;
            }
            paper_to_block.insert(paper_id.clone(), block_key.clone());
            blocks.entry(block_key).or_default().push(paper_id);
        }

        Ok(Self {
            blocks,
            paper_to_block,
        })
    }

    pub fn blocks(&self) -> &Blocks {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block key of a paper
    pub fn block_of(&self, paper_id: &str) -> Result<&str> {
        self.paper_to_block
            .get(paper_id)
            .map(String::as_str)
            .ok_or_else(|| LookupError::BlockNotFound(paper_id.to_string()).into())
    }

    /// Regroup a subset of paper ids into blocks, keeping the given order
    pub fn group_papers<I, S>(&self, paper_ids: I) -> Result<Blocks>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grouped = Blocks::new();
        for id in paper_ids {
            let id = id.as_ref();
            let block = self.block_of(id)?;
            grouped
                .entry(block.to_string())
                .or_default()
                .push(id.to_string());
        }
        Ok(grouped)
    }
}

/// Number of papers across all blocks
pub fn paper_count(blocks: &Blocks) -> usize {
    blocks.values().map(Vec::len).sum()
}
