//! Loading of dataset inputs from files or in-memory values
//!
//! Every input can be given either as a path or as an already-parsed
//! value through [`InputSource`]. Numeric ids are accepted wherever ids
//! appear and are turned into strings.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::{SeedDeclarations, SeedKind};
use crate::error::{InputError, Result};
use crate::record::{Author, AuthorBuilder, Paper, PaperBuilder};
use crate::sampling::{Clusters, Pair, PairLabel};

/// A dataset input given as a file path or as a parsed value
#[derive(Debug, Clone)]
pub enum InputSource<T> {
    Path(PathBuf),
    Value(T),
}

impl<T> InputSource<T> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        InputSource::Path(path.into())
    }

    pub fn value(value: T) -> Self {
        InputSource::Value(value)
    }

    /// Resolve to a value, reading the file with `read` when needed
    pub fn load_with<F>(self, read: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        match self {
            InputSource::Path(path) => read(&path),
            InputSource::Value(value) => Ok(value),
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        InputError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Render a JSON string or number as an id string
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => id_from_value(&v)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a string or number id, got {v}"))),
    }
}

fn lenient_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|v| {
            id_from_value(v)
                .ok_or_else(|| de::Error::custom(format!("expected a string or number id, got {v}")))
        })
        .collect()
}

/// Years may arrive as integers, integral floats, or numeric strings
///
/// Fractional or out-of-range numbers are rejected.
fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n,
        Some(Value::String(s)) => return Ok(s.trim().parse::<i32>().ok()),
        _ => return Ok(None),
    };
    let whole = match number.as_i64() {
        Some(i) => Some(i),
        None => number
            .as_f64()
            .and_then(integral)
            .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64),
    };
    whole
        .and_then(|y| i32::try_from(y).ok())
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid year: {number}")))
}

fn integral(f: f64) -> Option<f64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f)
}

/// Middle names may be a list or a single string
fn lenient_middle<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// An author as it appears in a papers file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAuthor {
    #[serde(alias = "author_info_first")]
    pub first: Option<String>,
    #[serde(deserialize_with = "lenient_middle")]
    pub middle: Vec<String>,
    pub author_info_middle: Option<String>,
    #[serde(alias = "author_info_last")]
    pub last: Option<String>,
    #[serde(alias = "author_info_suffix")]
    pub suffix: Option<String>,
    pub affiliations: Vec<String>,
    pub email: Option<String>,
}

impl RawAuthor {
    pub fn into_builder(self) -> AuthorBuilder {
        let mut builder = Author::builder().affiliations(self.affiliations);
        if let Some(first) = self.first {
            builder = builder.first(first);
        }
        let middle: Vec<String> = self
            .middle
            .into_iter()
            .chain(self.author_info_middle)
            .collect();
        if !middle.is_empty() {
            builder = builder.middle(middle.join(" "));
        }
        if let Some(last) = self.last {
            builder = builder.last(last);
        }
        if let Some(suffix) = self.suffix {
            builder = builder.suffix(suffix);
        }
        if let Some(email) = self.email {
            builder = builder.email(email);
        }
        builder
    }
}

/// A paper as it appears in a papers file; unknown fields are ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPaper {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub authors: Vec<RawAuthor>,
    pub venue: Option<String>,
    pub journal_name: Option<String>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    pub doi: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    pub pmid: Option<String>,
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    pub source_id: Option<String>,
    pub pdf_hash: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    pub block: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    pub corpus_paper_id: Option<String>,
}

impl RawPaper {
    pub fn into_builder(self, id: impl Into<String>) -> PaperBuilder {
        let mut builder = Paper::builder(id)
            .authors(self.authors.into_iter().map(RawAuthor::into_builder).collect())
            .maybe_year(self.year);
        if let Some(title) = self.title {
            builder = builder.title(title);
        }
        if let Some(abstract_text) = self.abstract_text {
            builder = builder.abstract_text(abstract_text);
        }
        if let Some(venue) = self.venue {
            builder = builder.venue(venue);
        }
        if let Some(journal_name) = self.journal_name {
            builder = builder.journal_name(journal_name);
        }
        if let Some(doi) = self.doi {
            builder = builder.doi(doi);
        }
        if let Some(pmid) = self.pmid {
            builder = builder.pmid(pmid);
        }
        if let Some(source) = self.source {
            builder = builder.source(source);
        }
        if let Some(source_id) = self.source_id {
            builder = builder.source_id(source_id);
        }
        if let Some(pdf_hash) = self.pdf_hash {
            builder = builder.pdf_hash(pdf_hash);
        }
        if let Some(block) = self.block {
            builder = builder.block(block);
        }
        if let Some(corpus_paper_id) = self.corpus_paper_id {
            builder = builder.corpus_paper_id(corpus_paper_id);
        }
        builder
    }
}

/// Papers keyed by id, in file order
pub type RawPapers = Vec<(String, RawPaper)>;

/// Parse a papers JSON object: id → paper
pub fn parse_papers(text: &str) -> Result<RawPapers> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(text)?;
    map.into_iter()
        .map(|(id, value)| -> Result<(String, RawPaper)> {
            Ok((id, serde_json::from_value(value)?))
        })
        .collect()
}

pub fn read_papers(path: &Path) -> Result<RawPapers> {
    tracing::debug!("loading papers from {}", path.display());
    parse_papers(&read_text(path)?)
}

#[derive(Deserialize)]
struct RawCluster {
    #[serde(deserialize_with = "lenient_ids")]
    sourced_paper_ids: Vec<String>,
}

/// Parse a clusters JSON object: cluster id → `{sourced_paper_ids: [...]}`
pub fn parse_clusters(text: &str) -> Result<Clusters> {
    let raw: HashMap<String, RawCluster> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|(cluster_id, cluster)| (cluster_id, cluster.sourced_paper_ids))
        .collect())
}

pub fn read_clusters(path: &Path) -> Result<Clusters> {
    tracing::debug!("loading clusters from {}", path.display());
    parse_clusters(&read_text(path)?)
}

/// Parse cluster seeds: id → {id → "require" | "disallow"}, order kept
pub fn parse_seeds(text: &str) -> Result<SeedDeclarations> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(text)?;
    let mut seeds = SeedDeclarations::new();
    for (root, targets) in map {
        let Value::Object(targets) = targets else {
            return Err(InputError::InvalidValue {
                field: format!("cluster_seeds[{root}]"),
                value: targets.to_string(),
            }
            .into());
        };
        seeds.declare_root(root.as_str());
        for (target, kind) in targets {
            let kind = match kind.as_str() {
                Some("require") => SeedKind::Require,
                Some("disallow") => SeedKind::Disallow,
                _ => {
                    return Err(InputError::InvalidValue {
                        field: format!("cluster_seeds[{root}][{target}]"),
                        value: kind.to_string(),
                    }
                    .into())
                }
            };
            seeds.declare(root.as_str(), target, kind);
        }
    }
    Ok(seeds)
}

pub fn read_seeds(path: &Path) -> Result<SeedDeclarations> {
    tracing::debug!("loading cluster seeds from {}", path.display());
    parse_seeds(&read_text(path)?)
}

/// Newline-separated ids; blank lines are skipped
pub fn read_id_lines(path: &Path) -> Result<Vec<String>> {
    Ok(read_text(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse a JSON array of paper ids
pub fn parse_paper_list(text: &str) -> Result<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    values
        .iter()
        .map(|v| {
            id_from_value(v).ok_or_else(|| {
                InputError::InvalidValue {
                    field: "paper id".to_string(),
                    value: v.to_string(),
                }
                .into()
            })
        })
        .collect()
}

pub fn read_paper_list(path: &Path) -> Result<Vec<String>> {
    parse_paper_list(&read_text(path)?)
}

/// Normalize a fixed-pair label
///
/// `YES`/`1` → Same and `NO`/`0` → Different. Negative integers mark
/// partial-supervision rows.
pub fn parse_pair_label(raw: &str) -> Result<PairLabel> {
    let raw = raw.trim();
    match raw {
        "YES" | "1" | "1.0" => Ok(PairLabel::Same),
        "NO" | "0" | "0.0" => Ok(PairLabel::Different),
        _ => match partial_label(raw) {
            Some(k) => Ok(PairLabel::Partial(k)),
            None => Err(InputError::InvalidValue {
                field: "label".to_string(),
                value: raw.to_string(),
            }
            .into()),
        },
    }
}

/// Negative integers, written as `-2` or `-2.0`
fn partial_label(raw: &str) -> Option<i32> {
    let k = match raw.parse::<i32>() {
        Ok(k) => k,
        Err(_) => {
            let f = raw.parse::<f64>().ok().and_then(integral)?;
            if f < i32::MIN as f64 {
                return None;
            }
            f as i32
        }
    };
    (k < 0).then_some(k)
}

#[derive(Deserialize)]
struct PairRow {
    paper_id_1: String,
    paper_id_2: String,
    label: String,
}

/// Read a `paper_id_1,paper_id_2,label` table; extra columns are ignored
pub fn parse_pairs_csv<R: std::io::Read>(reader: R) -> Result<Vec<Pair>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut pairs = Vec::new();
    for row in csv_reader.deserialize::<PairRow>() {
        let row = row?;
        pairs.push(Pair::new(
            row.paper_id_1,
            row.paper_id_2,
            parse_pair_label(&row.label)?,
        ));
    }
    Ok(pairs)
}

pub fn read_pairs_csv(path: &Path) -> Result<Vec<Pair>> {
    tracing::debug!("loading fixed pairs from {}", path.display());
    let file = fs::File::open(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_pairs_csv(file)
}

/// Paper id → embedding vector
pub type Embeddings = HashMap<String, Vec<f32>>;

/// Reassemble a row-major matrix and its row keys into a map
pub fn embeddings_from_parts(matrix: Vec<Vec<f32>>, keys: Vec<String>) -> Result<Embeddings> {
    if matrix.len() != keys.len() {
        return Err(InputError::InvalidValue {
            field: "embeddings".to_string(),
            value: format!("{} rows for {} keys", matrix.len(), keys.len()),
        }
        .into());
    }
    Ok(keys.into_iter().zip(matrix).collect())
}

/// Parse `[matrix, keys]` embeddings JSON
pub fn parse_embeddings(text: &str) -> Result<Embeddings> {
    let (matrix, keys): (Vec<Vec<f32>>, Vec<Value>) = serde_json::from_str(text)?;
    let keys = keys
        .iter()
        .map(|k| {
            id_from_value(k).ok_or_else(|| InputError::InvalidValue {
                field: "embedding key".to_string(),
                value: k.to_string(),
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    embeddings_from_parts(matrix, keys)
}

pub fn read_embeddings(path: &Path) -> Result<Embeddings> {
    tracing::debug!("loading embeddings from {}", path.display());
    parse_embeddings(&read_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_papers_accepts_numeric_ids() {
        let papers = parse_papers(
            r#"{
                "2": {"title": "B", "authors": [], "pmid": 991, "year": 2001.0},
                "1": {"title": "A", "abstract": "x", "unknown_field": true,
                      "authors": [{"first": "Ada", "middle": ["M"], "last": "Lovelace"}],
                      "block": 17}
            }"#,
        )
        .unwrap();
        assert_eq!(papers[0].0, "2");
        assert_eq!(papers[0].1.pmid.as_deref(), Some("991"));
        assert_eq!(papers[0].1.year, Some(2001));
        assert_eq!(papers[1].1.block.as_deref(), Some("17"));
        assert_eq!(papers[1].1.abstract_text.as_deref(), Some("x"));

        let paper = papers[1].1.clone().into_builder("1").build(&Default::default());
        assert_eq!(paper.authors()[0].full_name(), "ada m lovelace");
    }

    #[test]
    fn test_year_must_be_an_integral_i32() {
        let year = |raw: &str| parse_papers(&format!(r#"{{"1": {{"authors": [], "year": {raw}}}}}"#));
        assert_eq!(year("1999.0").unwrap()[0].1.year, Some(1999));
        assert_eq!(year(r#""2004""#).unwrap()[0].1.year, Some(2004));
        assert_eq!(year("null").unwrap()[0].1.year, None);
        for bad in ["1999.5", "3000000000", "-1e30"] {
            assert!(matches!(
                year(bad),
                Err(crate::PaperlinkError::Input(InputError::Json(_)))
            ));
        }
    }

    #[test]
    fn test_parse_seeds_keeps_order() {
        let seeds = parse_seeds(
            r#"{"z": {"a": "require"}, "b": {"c": "disallow", "d": "require"}, "q": {}}"#,
        )
        .unwrap();
        let roots: Vec<_> = seeds.roots().map(|(r, _)| r.to_string()).collect();
        assert_eq!(roots, vec!["z", "b", "q"]);
        assert!(parse_seeds(r#"{"a": {"b": "maybe"}}"#).is_err());
    }

    #[test]
    fn test_parse_clusters() {
        let clusters =
            parse_clusters(r#"{"c1": {"sourced_paper_ids": [1, "2"]}, "c2": {"sourced_paper_ids": []}}"#)
                .unwrap();
        assert_eq!(clusters["c1"], vec!["1", "2"]);
        assert!(clusters["c2"].is_empty());
    }

    #[test]
    fn test_pair_labels() {
        assert_eq!(parse_pair_label("YES").unwrap(), PairLabel::Same);
        assert_eq!(parse_pair_label("0").unwrap(), PairLabel::Different);
        assert_eq!(parse_pair_label("-2").unwrap(), PairLabel::Partial(-2));
        assert!(parse_pair_label("maybe").is_err());
        assert_eq!(parse_pair_label("-1.0").unwrap(), PairLabel::Partial(-1));
        assert_eq!(parse_pair_label("-3").unwrap(), PairLabel::Partial(-3));
        assert!(parse_pair_label("-1.5").is_err());
        assert!(parse_pair_label("2.0").is_err());
        assert!(parse_pair_label("-1e20").is_err());
    }

    #[test]
    fn test_pairs_csv() {
        let csv = "paper_id_1,paper_id_2,label,note\n1,2,YES,x\n3,4,0,y\n";
        let pairs = parse_pairs_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            pairs,
            vec![
                Pair::new("1", "2", PairLabel::Same),
                Pair::new("3", "4", PairLabel::Different),
            ]
        );
    }

    #[test]
    fn test_id_lines_and_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\nb\n\nc").unwrap();
        let ids = InputSource::path(file.path())
            .load_with(read_id_lines)
            .unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let same = InputSource::value(vec!["x".to_string()])
            .load_with(read_id_lines)
            .unwrap();
        assert_eq!(same, vec!["x"]);
    }

    #[test]
    fn test_embeddings() {
        let embeddings = parse_embeddings("[[[1.0, 2.0], [3.0, 4.0]], [\"a\", 7]]").unwrap();
        assert_eq!(embeddings["7"], vec![3.0, 4.0]);
        assert!(embeddings_from_parts(vec![vec![1.0]], vec![]).is_err());
    }
}
