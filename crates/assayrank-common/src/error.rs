use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssayRankError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unrecognised relation operator: relation={relation:?} value={value:?} unit={unit:?}")]
    MalformedRelation {
        relation: Option<String>,
        value: Option<f64>,
        unit: Option<String>,
    },

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Target identifier error: {0}")]
    TargetIdentifier(String),

    #[error("Document {0} has no query index")]
    UnknownDocument(String),

    #[error("qid {qid}: requested {requested} decoys but the candidate pool holds only {available}")]
    InsufficientCandidates {
        qid: u64,
        requested: usize,
        available: usize,
    },

    #[error("Feature extraction failed at row {row} ({structure}): {reason}")]
    FeatureExtraction {
        row: usize,
        structure: String,
        reason: String,
    },

    #[error("Ranking file error at line {line}: {reason}")]
    RankingFile { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External tool error: {0}")]
    ExternalTool(String),
}

impl AssayRankError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssayRankError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssayRankError>;
