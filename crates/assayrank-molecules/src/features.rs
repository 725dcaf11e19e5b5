//! Molecular feature vectors and the extraction seam.
//!
//! A feature vector is `fingerprint_bits` binary Morgan components followed by
//! the descriptor values in a canonical order. The order is fixed by
//! [`FeatureLayout`], built once per process from the extractor's native
//! descriptor list with excluded (charge-related) descriptors removed, so the
//! training and decoy files always agree column for column.

use std::collections::HashMap;

use assayrank_common::{AssayRankError, Result};
use async_trait::async_trait;

/// Raw output of the external extractor for one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    /// Indices of set fingerprint bits.
    pub on_bits: Vec<usize>,
    /// Every descriptor in the extractor's native order.
    pub descriptors: Vec<f64>,
}

/// Per-structure extraction outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(RawFeatures),
    /// The structure string could not be turned into a molecule.
    Unparsable(String),
}

/// Trait for the external cheminformatics capability.
///
/// Implementations can use:
/// - an RDKit helper process (production)
/// - canned per-structure data (testing)
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// All descriptor names, in the order `extract` reports their values.
    async fn descriptor_names(&self) -> Result<Vec<String>>;

    /// Featurize a batch. The result has exactly one entry per input structure.
    async fn extract(&self, structures: &[String], fingerprint_bits: usize) -> Result<Vec<Extraction>>;
}

/// Canonical column order shared by every ranking file written in a process.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    fingerprint_bits: usize,
    descriptor_names: Vec<String>,
    /// Position of each kept descriptor in the extractor's native list.
    source_positions: Vec<usize>,
    source_len: usize,
}

impl FeatureLayout {
    pub fn new(fingerprint_bits: usize, native_names: &[String], excluded_marker: &str) -> Self {
        let (source_positions, descriptor_names): (Vec<usize>, Vec<String>) = native_names
            .iter()
            .enumerate()
            .filter(|(_, name)| excluded_marker.is_empty() || !name.contains(excluded_marker))
            .map(|(i, name)| (i, name.clone()))
            .unzip();

        Self {
            fingerprint_bits,
            descriptor_names,
            source_positions,
            source_len: native_names.len(),
        }
    }

    pub fn fingerprint_bits(&self) -> usize {
        self.fingerprint_bits
    }

    pub fn descriptor_names(&self) -> &[String] {
        &self.descriptor_names
    }

    /// Total number of columns.
    pub fn len(&self) -> usize {
        self.fingerprint_bits + self.descriptor_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `ECFP4_1 .. ECFP4_<bits>` followed by the descriptor names.
    pub fn feature_names(&self) -> Vec<String> {
        (1..=self.fingerprint_bits)
            .map(|i| format!("ECFP4_{i}"))
            .chain(self.descriptor_names.iter().cloned())
            .collect()
    }

    /// Project raw extractor output onto this layout.
    ///
    /// A descriptor count or bit index that does not fit the layout means the
    /// extractor broke its contract; that is fatal, not a per-row failure.
    pub fn project(&self, raw: &RawFeatures) -> Result<FeatureVector> {
        if raw.descriptors.len() != self.source_len {
            return Err(AssayRankError::ExternalTool(format!(
                "extractor returned {} descriptors, expected {}",
                raw.descriptors.len(),
                self.source_len
            )));
        }
        if let Some(bad) = raw.on_bits.iter().find(|b| **b >= self.fingerprint_bits) {
            return Err(AssayRankError::ExternalTool(format!(
                "fingerprint bit {bad} out of range for {} bits",
                self.fingerprint_bits
            )));
        }

        let mut on_bits = raw.on_bits.clone();
        on_bits.sort_unstable();
        on_bits.dedup();

        let descriptors = self
            .source_positions
            .iter()
            .map(|&i| raw.descriptors[i])
            .collect();

        Ok(FeatureVector {
            fingerprint_bits: self.fingerprint_bits,
            on_bits,
            descriptors,
        })
    }
}

/// Fixed-length feature vector stored as set bits plus dense descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    fingerprint_bits: usize,
    on_bits: Vec<usize>,
    descriptors: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.fingerprint_bits + self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        if index < self.fingerprint_bits {
            Some(if self.on_bits.binary_search(&index).is_ok() { 1.0 } else { 0.0 })
        } else {
            self.descriptors.get(index - self.fingerprint_bits).copied()
        }
    }

    /// Non-zero components in ascending column order. NaN counts as non-zero.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        let offset = self.fingerprint_bits;
        self.on_bits.iter().map(|&i| (i, 1.0)).chain(
            self.descriptors
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(move |(j, v)| (offset + j, *v)),
        )
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.fingerprint_bits];
        for &i in &self.on_bits {
            dense[i] = 1.0;
        }
        dense.extend_from_slice(&self.descriptors);
        dense
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Mock extractor with canned per-structure features.
///
/// Structures not registered with [`MockFeatureExtractor::with`] are unparsable.
pub struct MockFeatureExtractor {
    names: Vec<String>,
    data: HashMap<String, RawFeatures>,
}

impl MockFeatureExtractor {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            data: HashMap::new(),
        }
    }

    /// Register a structure with its set bits and native-order descriptors.
    pub fn with(mut self, structure: &str, on_bits: &[usize], descriptors: &[f64]) -> Self {
        self.data.insert(
            structure.to_string(),
            RawFeatures {
                on_bits: on_bits.to_vec(),
                descriptors: descriptors.to_vec(),
            },
        );
        self
    }
}

#[async_trait]
impl FeatureExtractor for MockFeatureExtractor {
    async fn descriptor_names(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    async fn extract(&self, structures: &[String], _fingerprint_bits: usize) -> Result<Vec<Extraction>> {
        Ok(structures
            .iter()
            .map(|s| match self.data.get(s) {
                Some(raw) => Extraction::Parsed(raw.clone()),
                None => Extraction::Unparsable(format!("cannot parse {s:?}")),
            })
            .collect())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
