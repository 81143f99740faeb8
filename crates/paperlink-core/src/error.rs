//! Error types for paperlink-core

use thiserror::Error;

/// Result type alias for paperlink operations
pub type Result<T> = std::result::Result<T, PaperlinkError>;

/// Main error type for paperlink operations
#[derive(Error, Debug)]
pub enum PaperlinkError {
    /// Invalid configuration or dataset shape
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A referenced id does not exist
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Feature cache could not be read or written
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Input files could not be loaded
    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration errors. These are fatal and surfaced immediately.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Split ratios must add to 1
    #[error("train/val/test ratios should add to 1, got {train} + {val} + {test}")]
    RatiosDoNotSumToOne { train: f64, val: f64, test: f64 },

    /// Unknown unit of data split
    #[error("Unknown unit_of_data_split: {0}")]
    UnknownSplitUnit(String),

    /// Unknown dataset mode
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// Unknown feature group name
    #[error("Unknown feature group: {0}")]
    UnknownFeatureGroup(String),

    /// A paper appears under more than one block key
    #[error("Paper {paper_id} is in multiple blocks: {first} and {second}")]
    PaperInMultipleBlocks {
        paper_id: String,
        first: String,
        second: String,
    },

    /// The same paper id was supplied twice
    #[error("Duplicate paper id: {0}")]
    DuplicatePaperId(String),

    /// Fixed pairs were requested but not supplied
    #[error("Missing fixed pairs: {0}")]
    MissingFixedPairs(String),

    /// Fixed papers were requested but not supplied
    #[error("Missing fixed papers: {0}")]
    MissingFixedPapers(String),

    /// Ground-truth clusters are needed but the dataset has none
    #[error("Dataset {0} has no ground-truth clusters")]
    MissingClusters(String),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// The configured data directory does not exist
    #[error("Data directory does not exist: {0}")]
    MissingDataDir(String),

    /// Config text did not parse
    #[error("Invalid config: {0}")]
    Parse(String),
}

/// Lookup errors for ids absent from the record store or its side tables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// Paper id not in the record store
    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    /// Paper id has no block assignment
    #[error("Paper has no block: {0}")]
    BlockNotFound(String),

    /// Paper id has no ground-truth cluster
    #[error("Paper has no ground-truth cluster: {0}")]
    ClusterNotFound(String),
}

/// Feature cache errors. A malformed file is never repaired.
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO error
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    /// Cache file did not parse
    #[error("Malformed cache file {path}: {message}")]
    Malformed { path: String, message: String },

    /// Cached vector has the wrong width
    #[error("Cached vector for {key} has {actual} values, expected {expected}")]
    WidthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors loading external inputs
#[derive(Error, Debug)]
pub enum InputError {
    /// IO error
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV parse error
    #[error("CSV error: {0}")]
    Csv(String),

    /// Unrecognized value in an input field
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl From<serde_json::Error> for InputError {
    fn from(err: serde_json::Error) -> Self {
        InputError::Json(err.to_string())
    }
}

impl From<csv::Error> for InputError {
    fn from(err: csv::Error) -> Self {
        InputError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for PaperlinkError {
    fn from(err: serde_json::Error) -> Self {
        PaperlinkError::Input(InputError::from(err))
    }
}

impl From<csv::Error> for PaperlinkError {
    fn from(err: csv::Error) -> Self {
        PaperlinkError::Input(InputError::from(err))
    }
}
