//! Read-only paper arena shared by the pipeline

use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::paper::{Paper, PaperBuilder};
use crate::error::{ConfigError, LookupError, Result};

/// Papers in insertion order plus an id → index map
///
/// Built once; wrap it in an `Arc` to share it with worker threads.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    papers: Vec<Paper>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    /// Store already-built papers, rejecting duplicate ids
    pub fn new(papers: Vec<Paper>) -> Result<Self> {
        let mut index = HashMap::with_capacity(papers.len());
        for (i, paper) in papers.iter().enumerate() {
            if index.insert(paper.id().to_string(), i).is_some() {
                return Err(ConfigError::DuplicatePaperId(paper.id().to_string()).into());
            }
        }
        Ok(Self { papers, index })
    }

    /// Preprocess raw papers on `n_jobs` threads and store them
    pub fn from_builders(
        builders: Vec<PaperBuilder>,
        name_prefixes: &HashSet<String>,
        n_jobs: usize,
    ) -> Result<Self> {
        tracing::info!("preprocessing {} papers", builders.len());

        #[cfg(feature = "parallel")]
        let papers: Vec<Paper> = crate::pool::install(n_jobs, || {
            builders
                .into_par_iter()
                .map(|b| b.build(name_prefixes))
                .collect()
        });

        #[cfg(not(feature = "parallel"))]
        let papers: Vec<Paper> = {
            let _ = n_jobs;
            builders
                .into_iter()
                .map(|b| b.build(name_prefixes))
                .collect()
        };

        Self::new(papers)
    }

    pub fn get(&self, id: &str) -> Option<&Paper> {
        self.index.get(id).map(|&i| &self.papers[i])
    }

    /// Like [`get`](Self::get), but a missing id is a lookup error
    pub fn paper(&self, id: &str) -> Result<&Paper> {
        self.get(id)
            .ok_or_else(|| LookupError::PaperNotFound(id.to_string()).into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Paper> {
        self.papers.iter()
    }

    /// Paper ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.papers.iter().map(Paper::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(id: &str) -> PaperBuilder {
        Paper::builder(id).title(format!("Title {id}"))
    }

    #[test]
    fn test_lookup() {
        let store =
            RecordStore::from_builders(vec![builder("a"), builder("b")], &HashSet::new(), 2)
                .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.paper("b").unwrap().title(), "Title b");
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(store.get("zzz").is_none());
    }

    #[test]
    fn test_missing_id_is_lookup_error() {
        let store = RecordStore::default();
        assert!(matches!(
            store.paper("x"),
            Err(crate::PaperlinkError::Lookup(LookupError::PaperNotFound(_)))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = RecordStore::from_builders(vec![builder("a"), builder("a")], &HashSet::new(), 1);
        assert!(matches!(
            result,
            Err(crate::PaperlinkError::Config(ConfigError::DuplicatePaperId(_)))
        ));
    }
}
