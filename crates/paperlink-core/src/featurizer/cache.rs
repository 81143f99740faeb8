//! Two-tier feature cache
//!
//! Vectors are persisted per dataset and featurizer version in
//! `all_features.json`. Once a file has been read, its contents stay in a
//! process-wide layer keyed by file path, so later passes in the same
//! process skip the disk entirely. An open handle takes the contents out of
//! the layer and [`FeatureCache::flush`] puts them back, so inserts mutate
//! the map in place.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::info::{all_feature_names, full_width, FeaturizationInfo};
use crate::error::{CacheError, Result};

lazy_static! {
    static ref PROCESS_CACHE: Mutex<HashMap<PathBuf, Arc<CacheContents>>> =
        Mutex::new(HashMap::new());
}

/// Cache key of an ordered pair
pub fn feature_cache_key(paper_id_1: &str, paper_id_2: &str) -> String {
    format!("{paper_id_1}___{paper_id_2}")
}

/// On-disk layout; NaN is stored as `null`
///
/// `features_to_use` always lists every feature, since stored vectors are
/// full width whatever groups the caller emits.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    features: HashMap<String, Vec<Option<f64>>>,
    #[serde(default)]
    features_to_use: Vec<String>,
}

/// Cached full-width vectors keyed by ordered pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheContents {
    features: HashMap<String, Vec<f64>>,
}

impl CacheContents {
    fn from_file(file: CacheFile, path: &Path) -> Result<Self> {
        let width = full_width();
        let mut features = HashMap::with_capacity(file.features.len());
        for (key, values) in file.features {
            if values.len() != width {
                return Err(CacheError::WidthMismatch {
                    key,
                    expected: width,
                    actual: values.len(),
                }
                .into());
            }
            features.insert(key, values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect());
        }
        tracing::debug!("cache {} loaded with {} keys", path.display(), features.len());
        Ok(Self { features })
    }

    fn to_file(&self) -> CacheFile {
        CacheFile {
            features: self
                .features
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        v.iter().map(|x| if x.is_nan() { None } else { Some(*x) }).collect(),
                    )
                })
                .collect(),
            features_to_use: all_feature_names(),
        }
    }
}

/// Open handle on one dataset's feature cache
#[derive(Debug)]
pub struct FeatureCache {
    path: PathBuf,
    contents: Arc<CacheContents>,
    changed: bool,
}

impl FeatureCache {
    /// Open the cache for `dataset_name` under `cache_root`
    ///
    /// The process-wide layer wins over the disk; a missing file starts an
    /// empty cache. A malformed file is an error and is left untouched.
    /// Dropping the handle without flushing leaves the next open to read
    /// the disk.
    pub fn open(cache_root: &Path, dataset_name: &str, info: &FeaturizationInfo) -> Result<Self> {
        let path = info.cache_file_path(cache_root, dataset_name);

        if let Some(contents) = process_layer_take(&path) {
            tracing::debug!("using in-memory cache for {}", path.display());
            return Ok(Self {
                path,
                contents,
                changed: false,
            });
        }

        let contents = if path.exists() {
            tracing::debug!("loading cache from {}", path.display());
            let file = fs::File::open(&path).map_err(|e| CacheError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let parsed: CacheFile =
                serde_json::from_reader(BufReader::new(file)).map_err(|e| CacheError::Malformed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            CacheContents::from_file(parsed, &path)?
        } else {
            tracing::debug!("cache initiated at {}", path.display());
            CacheContents::default()
        };

        Ok(Self {
            path,
            contents: Arc::new(contents),
            changed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.contents.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.features.is_empty()
    }

    /// Whether entries were added since the cache was opened
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Look a pair up in either orientation
    pub fn get(&self, paper_id_1: &str, paper_id_2: &str) -> Option<&[f64]> {
        let features = &self.contents.features;
        features
            .get(&feature_cache_key(paper_id_1, paper_id_2))
            .or_else(|| features.get(&feature_cache_key(paper_id_2, paper_id_1)))
            .map(Vec::as_slice)
    }

    /// Store a vector under the given orientation only
    pub fn insert(&mut self, paper_id_1: &str, paper_id_2: &str, vector: Vec<f64>) {
        Arc::make_mut(&mut self.contents)
            .features
            .insert(feature_cache_key(paper_id_1, paper_id_2), vector);
        self.changed = true;
    }

    /// Persist new entries and publish the contents to the process layer
    pub fn flush(self) -> Result<()> {
        if self.changed {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir).map_err(|e| CacheError::Io {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                })?;
            }
            let io_err = |e: std::io::Error| CacheError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            };
            let mut writer = BufWriter::new(fs::File::create(&self.path).map_err(io_err)?);
            serde_json::to_writer(&mut writer, &self.contents.to_file())
                .map_err(std::io::Error::from)
                .and_then(|_| writer.flush())
                .map_err(io_err)?;
            tracing::debug!(
                "cache written to {} with {} keys",
                self.path.display(),
                self.contents.features.len()
            );
        }

        process_layer_put(self.path, self.contents);
        Ok(())
    }
}

fn process_layer_take(path: &Path) -> Option<Arc<CacheContents>> {
    let mut layer = PROCESS_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    layer.remove(path)
}

fn process_layer_put(path: PathBuf, contents: Arc<CacheContents>) {
    let mut layer = PROCESS_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    layer.insert(path, contents);
}

/// Drop every in-memory cache layer, forcing the next open to read disk
pub fn clear_process_cache() {
    PROCESS_CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(fill: f64) -> Vec<f64> {
        vec![fill; full_width()]
    }

    #[test]
    fn test_both_orientations() {
        let root = tempfile::tempdir().unwrap();
        let info = FeaturizationInfo::default();
        let mut cache = FeatureCache::open(root.path(), "orient", &info).unwrap();
        cache.insert("a", "b", vector(0.5));
        assert_eq!(cache.get("b", "a").unwrap()[0], 0.5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_nan_round_trips_through_disk() {
        let root = tempfile::tempdir().unwrap();
        let info = FeaturizationInfo::default();
        let mut cache = FeatureCache::open(root.path(), "nan", &info).unwrap();
        let mut v = vector(1.0);
        v[3] = f64::NAN;
        cache.insert("x", "y", v);
        let path = cache.path().to_path_buf();
        cache.flush().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["features"]["x___y"][3].is_null());
        assert_eq!(raw["features_to_use"], serde_json::json!(all_feature_names()));

        clear_process_cache();
        let reopened = FeatureCache::open(root.path(), "nan", &info).unwrap();
        assert!(reopened.get("x", "y").unwrap()[3].is_nan());
    }

    #[test]
    fn test_open_handle_owns_contents() {
        let root = tempfile::tempdir().unwrap();
        let info = FeaturizationInfo::default();
        let mut cache = FeatureCache::open(root.path(), "owned", &info).unwrap();
        cache.insert("a", "b", vector(1.0));
        let path = cache.path().to_path_buf();
        cache.flush().unwrap();

        let mut cache = FeatureCache::open(root.path(), "owned", &info).unwrap();
        assert!(!PROCESS_CACHE.lock().unwrap().contains_key(&path));
        assert_eq!(Arc::strong_count(&cache.contents), 1);
        let before = Arc::as_ptr(&cache.contents);
        cache.insert("c", "d", vector(2.0));
        assert_eq!(Arc::as_ptr(&cache.contents), before);
        assert_eq!(cache.len(), 2);
        cache.flush().unwrap();
    }

    #[test]
    fn test_malformed_file_is_error() {
        let root = tempfile::tempdir().unwrap();
        let info = FeaturizationInfo::default();
        let path = info.cache_file_path(root.path(), "broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();
        let result = FeatureCache::open(root.path(), "broken", &info);
        assert!(matches!(
            result,
            Err(crate::PaperlinkError::Cache(CacheError::Malformed { .. }))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_wrong_width_is_error() {
        let root = tempfile::tempdir().unwrap();
        let info = FeaturizationInfo::default();
        let path = info.cache_file_path(root.path(), "narrow");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"features": {"a___b": [1.0]}, "features_to_use": []}"#).unwrap();
        assert!(matches!(
            FeatureCache::open(root.path(), "narrow", &info),
            Err(crate::PaperlinkError::Cache(CacheError::WidthMismatch { .. }))
        ));
    }
}
