//! Deterministic merge constraints
//!
//! Before any learned similarity is consulted, a pair of papers may already
//! be settled: declared seeds and shared identifiers force a merge, while
//! explicit prohibitions and conflicting publisher ids forbid one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::LARGE_DISTANCE;
use crate::error::Result;
use crate::record::{Paper, RecordStore};
use crate::text::is_publisher_source;

/// Kind of a declared seed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Require,
    Disallow,
}

/// Seed edges grouped by root paper, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedDeclarations {
    roots: Vec<(String, Vec<(String, SeedKind)>)>,
    // root id -> position in `roots`
    index: HashMap<String, usize>,
}

impl SeedDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an edge from `root` to `target`
    ///
    /// Edges for a root already declared are appended to that root.
    pub fn declare(
        &mut self,
        root: impl Into<String>,
        target: impl Into<String>,
        kind: SeedKind,
    ) -> &mut Self {
        let position = self.position(root.into());
        self.roots[position].1.push((target.into(), kind));
        self
    }

    /// Add a root with no edges; it still counts toward group numbering
    pub fn declare_root(&mut self, root: impl Into<String>) -> &mut Self {
        self.position(root.into());
        self
    }

    fn position(&mut self, root: String) -> usize {
        if let Some(&position) = self.index.get(&root) {
            return position;
        }
        let position = self.roots.len();
        self.index.insert(root.clone(), position);
        self.roots.push((root, Vec::new()));
        position
    }

    pub fn roots(&self) -> impl Iterator<Item = (&str, &[(String, SeedKind)])> {
        self.roots.iter().map(|(r, e)| (r.as_str(), e.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Outcome of resolving a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The pair must be merged
    Require,
    /// The pair must not be merged
    Disallow,
    /// No rule applies; defer to the learned model
    Unknown,
}

/// Switches for [`ConstraintSet::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Disallow pairs whose papers sit in different seed groups
    pub dont_merge_on_conflicting_seeds: bool,
    /// Skip the same-seed-group rule (incremental clustering)
    pub ignore_seeds: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            dont_merge_on_conflicting_seeds: true,
            ignore_seeds: false,
        }
    }
}

/// Parsed seed constraints of one dataset
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    disallow: HashSet<(String, String)>,
    seed_groups: HashMap<String, usize>,
    max_seed_group: Option<usize>,
}

impl ConstraintSet {
    /// No declared constraints; only identifier rules apply
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse declared seeds into disallow edges and seed groups
    ///
    /// Roots are scanned in declaration order and root *n* opens group *n*,
    /// counting roots without require edges. The root takes the group the
    /// first time one of its require edges is seen; each require target
    /// takes it unconditionally, so a later group overwrites an earlier one.
    pub fn from_seeds(seeds: &SeedDeclarations) -> Self {
        let mut disallow = HashSet::new();
        let mut seed_groups = HashMap::new();
        let mut group = 0;

        for (root, edges) in seeds.roots() {
            let mut root_added = false;
            for (target, kind) in edges {
                match kind {
                    SeedKind::Disallow => {
                        disallow.insert((root.to_string(), target.clone()));
                    }
                    SeedKind::Require => {
                        if !root_added {
                            seed_groups.insert(root.to_string(), group);
                            root_added = true;
                        }
                        seed_groups.insert(target.clone(), group);
                    }
                }
            }
            group += 1;
        }

        tracing::debug!(
            "loaded {} disallow edges and {} seeded papers",
            disallow.len(),
            seed_groups.len()
        );

        Self {
            disallow,
            seed_groups,
            max_seed_group: Some(group),
        }
    }

    /// Number of seed roots scanned, or `None` without declarations
    pub fn max_seed_group(&self) -> Option<usize> {
        self.max_seed_group
    }

    /// Seed group of a paper, if it was seeded with a require edge
    pub fn seed_group(&self, paper_id: &str) -> Option<usize> {
        self.seed_groups.get(paper_id).copied()
    }

    fn is_disallowed(&self, a: &str, b: &str) -> bool {
        self.disallow.contains(&(a.to_string(), b.to_string()))
            || self.disallow.contains(&(b.to_string(), a.to_string()))
    }

    /// Settle a pair by the first matching rule
    ///
    /// Both ids must exist in `store`.
    pub fn resolve(
        &self,
        store: &RecordStore,
        paper_id_1: &str,
        paper_id_2: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        let paper_1 = store.paper(paper_id_1)?;
        let paper_2 = store.paper(paper_id_2)?;

        if self.is_disallowed(paper_id_1, paper_id_2) {
            return Ok(Resolution::Disallow);
        }

        let group_1 = self.seed_group(paper_id_1);
        let group_2 = self.seed_group(paper_id_2);
        if let (Some(g1), Some(g2)) = (group_1, group_2) {
            if g1 == g2 && !options.ignore_seeds {
                return Ok(Resolution::Require);
            }
            if g1 != g2 && options.dont_merge_on_conflicting_seeds {
                return Ok(Resolution::Disallow);
            }
        }

        Ok(resolve_identifiers(paper_1, paper_2))
    }

    /// [`resolve`](Self::resolve) mapped onto clusterer distances
    ///
    /// Require → `low`, Disallow → `high`, Unknown → `None`.
    pub fn distance(
        &self,
        store: &RecordStore,
        paper_id_1: &str,
        paper_id_2: &str,
        low: f64,
        high: f64,
        options: ResolveOptions,
    ) -> Result<Option<f64>> {
        Ok(match self.resolve(store, paper_id_1, paper_id_2, options)? {
            Resolution::Require => Some(low),
            Resolution::Disallow => Some(high),
            Resolution::Unknown => None,
        })
    }

    /// [`distance`](Self::distance) with the default 0 / `LARGE_DISTANCE` values
    pub fn default_distance(
        &self,
        store: &RecordStore,
        paper_id_1: &str,
        paper_id_2: &str,
    ) -> Result<Option<f64>> {
        self.distance(
            store,
            paper_id_1,
            paper_id_2,
            0.0,
            LARGE_DISTANCE,
            ResolveOptions::default(),
        )
    }
}

fn same_present<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Identifier rules: shared DOI, PMID, or PDF hash force a merge; two
/// different ids from the same trusted publisher forbid one.
fn resolve_identifiers(paper_1: &Paper, paper_2: &Paper) -> Resolution {
    if same_present(paper_1.doi(), paper_2.doi())
        || same_present(paper_1.pmid(), paper_2.pmid())
        || same_present(paper_1.pdf_hash(), paper_2.pdf_hash())
    {
        return Resolution::Require;
    }

    if let (Some(id_1), Some(id_2)) = (paper_1.source_id(), paper_2.source_id()) {
        if paper_1.source() == paper_2.source() && is_publisher_source(paper_1.source()) && id_1 != id_2
        {
            return Resolution::Disallow;
        }
    }

    Resolution::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as Set;

    fn store(papers: Vec<crate::record::PaperBuilder>) -> RecordStore {
        RecordStore::new(papers.into_iter().map(|b| b.build(&Set::new())).collect()).unwrap()
    }

    #[test]
    fn test_seed_groups_follow_declaration_order() {
        let mut seeds = SeedDeclarations::new();
        seeds
            .declare("a", "b", SeedKind::Require)
            .declare("c", "d", SeedKind::Disallow)
            .declare("e", "b", SeedKind::Require);
        let constraints = ConstraintSet::from_seeds(&seeds);

        assert_eq!(constraints.seed_group("a"), Some(0));
        // overwritten by the later root
        assert_eq!(constraints.seed_group("b"), Some(2));
        assert_eq!(constraints.seed_group("e"), Some(2));
        assert_eq!(constraints.seed_group("c"), None);
        assert_eq!(constraints.max_seed_group(), Some(3));
    }

    #[test]
    fn test_repeated_roots_append_in_place() {
        let mut seeds = SeedDeclarations::new();
        seeds
            .declare("a", "b", SeedKind::Require)
            .declare_root("z")
            .declare("a", "c", SeedKind::Disallow)
            .declare_root("a");
        let roots: Vec<_> = seeds.roots().map(|(r, e)| (r.to_string(), e.len())).collect();
        assert_eq!(roots, vec![("a".to_string(), 2), ("z".to_string(), 0)]);
    }

    #[test]
    fn test_many_roots_declare_quickly() {
        let n = 200_000;
        let started = std::time::Instant::now();
        let mut seeds = SeedDeclarations::new();
        for i in 0..n {
            seeds.declare(format!("r{i}"), format!("t{i}"), SeedKind::Require);
        }
        let constraints = ConstraintSet::from_seeds(&seeds);
        assert_eq!(seeds.len(), n);
        assert_eq!(constraints.max_seed_group(), Some(n));
        assert_eq!(constraints.seed_group(&format!("t{}", n - 1)), Some(n - 1));
        // a linear scan per root would take minutes at this size
        assert!(started.elapsed() < std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_disallow_beats_doi() {
        let s = store(vec![
            Paper::builder("1").doi("10.1/x"),
            Paper::builder("2").doi("10.1/X"),
        ]);
        let mut seeds = SeedDeclarations::new();
        seeds.declare("2", "1", SeedKind::Disallow);
        let constraints = ConstraintSet::from_seeds(&seeds);

        let options = ResolveOptions::default();
        assert_eq!(
            constraints.resolve(&s, "1", "2", options).unwrap(),
            Resolution::Disallow
        );
        assert_eq!(
            ConstraintSet::empty().resolve(&s, "1", "2", options).unwrap(),
            Resolution::Require
        );
    }

    #[test]
    fn test_seed_rules() {
        let s = store(vec![
            Paper::builder("1"),
            Paper::builder("2"),
            Paper::builder("3"),
            Paper::builder("4"),
        ]);
        let mut seeds = SeedDeclarations::new();
        seeds
            .declare("1", "2", SeedKind::Require)
            .declare("3", "4", SeedKind::Require);
        let constraints = ConstraintSet::from_seeds(&seeds);

        let options = ResolveOptions::default();
        assert_eq!(constraints.resolve(&s, "1", "2", options).unwrap(), Resolution::Require);
        assert_eq!(constraints.resolve(&s, "1", "3", options).unwrap(), Resolution::Disallow);

        let lenient = ResolveOptions {
            dont_merge_on_conflicting_seeds: false,
            ignore_seeds: true,
        };
        assert_eq!(constraints.resolve(&s, "1", "2", lenient).unwrap(), Resolution::Unknown);
        assert_eq!(constraints.resolve(&s, "1", "3", lenient).unwrap(), Resolution::Unknown);
    }

    #[test]
    fn test_identifier_rules() {
        let s = store(vec![
            Paper::builder("pm1").pmid("123"),
            Paper::builder("pm2").pmid("123"),
            Paper::builder("pdf1").pdf_hash("abc"),
            Paper::builder("pdf2").pdf_hash("abc"),
            Paper::builder("pub1").source("Elsevier").source_id("S1"),
            Paper::builder("pub2").source("Elsevier").source_id("S2"),
            Paper::builder("arx1").source("arXiv").source_id("A1"),
            Paper::builder("arx2").source("arXiv").source_id("A2"),
        ]);
        let c = ConstraintSet::empty();
        let o = ResolveOptions::default();
        assert_eq!(c.resolve(&s, "pm1", "pm2", o).unwrap(), Resolution::Require);
        assert_eq!(c.resolve(&s, "pdf1", "pdf2", o).unwrap(), Resolution::Require);
        assert_eq!(c.resolve(&s, "pub1", "pub2", o).unwrap(), Resolution::Disallow);
        assert_eq!(c.resolve(&s, "arx1", "arx2", o).unwrap(), Resolution::Unknown);
        assert_eq!(c.resolve(&s, "pm1", "pdf1", o).unwrap(), Resolution::Unknown);
    }

    #[test]
    fn test_distance() {
        let s = store(vec![
            Paper::builder("1").doi("10.1/x"),
            Paper::builder("2").doi("10.1/x"),
            Paper::builder("3"),
        ]);
        let c = ConstraintSet::empty();
        assert_eq!(c.default_distance(&s, "1", "2").unwrap(), Some(0.0));
        assert_eq!(c.default_distance(&s, "1", "3").unwrap(), None);
        assert_eq!(
            c.distance(&s, "1", "2", -1.0, 99.0, ResolveOptions::default())
                .unwrap(),
            Some(-1.0)
        );
    }

    #[test]
    fn test_unknown_id_is_lookup_error() {
        let s = store(vec![Paper::builder("1")]);
        assert!(ConstraintSet::empty()
            .resolve(&s, "1", "404", ResolveOptions::default())
            .is_err());
    }
}
