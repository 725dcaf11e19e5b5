//! Configuration loading for assayrank.
//! Reads assayrank.toml from the current directory or the path in ASSAYRANK_CONFIG.
//! Every field has a default, so a missing file yields the reference settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{AssayRankError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub decoys: DecoyConfig,
}

/// How duplicate (compound, document) rows are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// First occurrence in input order wins.
    #[default]
    KeepFirst,
    /// First occurrence carrying both a value and a unit wins; falls back to the first row.
    PreferComplete,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "keep_first" | "keep-first" => Ok(DedupPolicy::KeepFirst),
            "prefer_complete" | "prefer-complete" => Ok(DedupPolicy::PreferComplete),
            other => Err(format!("unknown dedup policy '{other}' (expected keep_first or prefer_complete)")),
        }
    }
}

/// What to do when a structure string cannot be turned into features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsablePolicy {
    Abort,
    Skip,
}

impl FromStr for UnparsablePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "abort" => Ok(UnparsablePolicy::Abort),
            "skip" => Ok(UnparsablePolicy::Skip),
            other => Err(format!("unknown unparsable-structure policy '{other}' (expected abort or skip)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_ic50_threshold")]
    pub ic50_threshold_um: f64,
    #[serde(default = "default_positive_epsilon")]
    pub positive_epsilon: f64,
    #[serde(default)]
    pub dedup_policy: DedupPolicy,
}

fn default_ic50_threshold()  -> f64 { 100.0 }
fn default_positive_epsilon() -> f64 { 1e-12 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ic50_threshold_um: default_ic50_threshold(),
            positive_epsilon: default_positive_epsilon(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Token in the input file name whose following digit names the target.
    #[serde(default = "default_target_prefix")]
    pub target_prefix: String,
}

fn default_target_prefix() -> String { "SIRT".to_string() }

impl Default for QueryConfig {
    fn default() -> Self {
        Self { target_prefix: default_target_prefix() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_fingerprint_bits")]
    pub fingerprint_bits: usize,
    /// Descriptors whose name contains this marker are left out of the layout.
    #[serde(default = "default_excluded_marker")]
    pub excluded_descriptor_marker: String,
    #[serde(default = "default_rdkit_command")]
    pub rdkit_command: Vec<String>,
    #[serde(default = "default_training_policy")]
    pub training_on_unparsable: UnparsablePolicy,
    #[serde(default = "default_decoy_policy")]
    pub decoy_on_unparsable: UnparsablePolicy,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
    /// Structures sent to the extractor per call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_fingerprint_bits() -> usize  { 2048 }
fn default_excluded_marker()  -> String { "Charge".to_string() }
fn default_rdkit_command()    -> Vec<String> {
    vec!["python3".to_string(), "scripts/rdkit_features.py".to_string()]
}
fn default_training_policy()  -> UnparsablePolicy { UnparsablePolicy::Abort }
fn default_decoy_policy()     -> UnparsablePolicy { UnparsablePolicy::Skip }
fn default_progress_every()   -> usize  { 1000 }
fn default_batch_size()       -> usize  { 10_000 }

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fingerprint_bits: default_fingerprint_bits(),
            excluded_descriptor_marker: default_excluded_marker(),
            rdkit_command: default_rdkit_command(),
            training_on_unparsable: default_training_policy(),
            decoy_on_unparsable: default_decoy_policy(),
            progress_every: default_progress_every(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoyConfig {
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: usize,
    /// Keep every Nth candidate while reading the candidate list.
    #[serde(default = "default_read_stride")]
    pub read_stride: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub dummy_relevance: f64,
}

fn default_sample_ratio() -> usize { 10 }
fn default_read_stride()  -> usize { 10 }

impl Default for DecoyConfig {
    fn default() -> Self {
        Self {
            sample_ratio: default_sample_ratio(),
            read_stride: default_read_stride(),
            seed: None,
            dummy_relevance: 0.0,
        }
    }
}


impl Config {
    /// Load configuration.
    /// An explicit path must exist; otherwise ASSAYRANK_CONFIG is checked,
    /// then ./assayrank.toml, and defaults are used when neither is present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("ASSAYRANK_CONFIG") {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from("assayrank.toml"), false),
            },
        };

        if !path.exists() {
            if required {
                return Err(AssayRankError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("No assayrank.toml found, using default configuration");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| AssayRankError::io(&path, e))?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scoring.ic50_threshold_um > 0.0) {
            return Err(AssayRankError::Config(format!(
                "scoring.ic50_threshold_um must be positive, got {}",
                self.scoring.ic50_threshold_um
            )));
        }
        if self.features.fingerprint_bits == 0 {
            return Err(AssayRankError::Config("features.fingerprint_bits must be non-zero".into()));
        }
        if self.features.batch_size == 0 {
            return Err(AssayRankError::Config("features.batch_size must be non-zero".into()));
        }
        if self.features.rdkit_command.is_empty() {
            return Err(AssayRankError::Config("features.rdkit_command must name a program".into()));
        }
        if self.decoys.read_stride == 0 {
            return Err(AssayRankError::Config("decoys.read_stride must be at least 1".into()));
        }
        if self.query.target_prefix.is_empty() {
            return Err(AssayRankError::Config("query.target_prefix must not be empty".into()));
        }
        Ok(())
    }
}
