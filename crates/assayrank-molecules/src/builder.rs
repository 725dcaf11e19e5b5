//! Feature vector builder: labeled structures in, ranking matrix out.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use assayrank_common::config::FeatureConfig;
use assayrank_common::{AssayRankError, Result, UnparsablePolicy};
use tracing::{debug, info, warn};

use crate::features::{Extraction, FeatureExtractor, FeatureLayout, FeatureVector};

/// One row to featurize.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStructure {
    /// Features are computed once per distinct key (compound id, or the
    /// structure itself when there is no id).
    pub key: String,
    pub structure: String,
    pub relevance: f64,
    pub qid: u64,
}

/// Feature matrix, labels and qids, sorted by qid.
#[derive(Debug, Clone)]
pub struct RankingMatrix {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<f64>,
    pub qids: Vec<u64>,
    pub n_columns: usize,
    /// Input row indices dropped as unparsable.
    pub skipped_rows: Vec<usize>,
}

impl RankingMatrix {
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_columns)
    }
}

pub struct FeatureBuilder {
    extractor: Arc<dyn FeatureExtractor>,
    layout: FeatureLayout,
    on_unparsable: UnparsablePolicy,
    batch_size: usize,
    progress_every: usize,
}

impl FeatureBuilder {
    /// Query the extractor's descriptor list and fix the column layout.
    ///
    /// Starts with the training failure policy; use [`with_policy`](Self::with_policy)
    /// for the decoy stage.
    pub async fn new(extractor: Arc<dyn FeatureExtractor>, config: &FeatureConfig) -> Result<Self> {
        let native = extractor.descriptor_names().await?;
        let layout = FeatureLayout::new(
            config.fingerprint_bits,
            &native,
            &config.excluded_descriptor_marker,
        );
        debug!(
            native = native.len(),
            kept = layout.descriptor_names().len(),
            columns = layout.len(),
            "Feature layout fixed"
        );

        Ok(Self {
            extractor,
            layout,
            on_unparsable: config.training_on_unparsable,
            batch_size: config.batch_size.max(1),
            progress_every: config.progress_every,
        })
    }

    pub fn with_policy(mut self, policy: UnparsablePolicy) -> Self {
        self.on_unparsable = policy;
        self
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub async fn build(&self, rows: &[LabeledStructure]) -> Result<RankingMatrix> {
        // Distinct keys in first-seen order.
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut distinct: Vec<&LabeledStructure> = Vec::new();
        for row in rows {
            slots.entry(row.key.as_str()).or_insert_with(|| {
                distinct.push(row);
                distinct.len() - 1
            });
        }
        info!(rows = rows.len(), distinct = distinct.len(), "Extracting features");

        let mut extracted: Vec<std::result::Result<FeatureVector, String>> =
            Vec::with_capacity(distinct.len());
        let mut last_report = 0;
        for batch in distinct.chunks(self.batch_size) {
            let structures: Vec<String> = batch.iter().map(|r| r.structure.clone()).collect();
            let results = self
                .extractor
                .extract(&structures, self.layout.fingerprint_bits())
                .await?;
            if results.len() != structures.len() {
                return Err(AssayRankError::ExternalTool(format!(
                    "extractor returned {} results for {} structures",
                    results.len(),
                    structures.len()
                )));
            }
            for result in results {
                extracted.push(match result {
                    Extraction::Parsed(raw) => Ok(self.layout.project(&raw)?),
                    Extraction::Unparsable(reason) => Err(reason),
                });
            }

            let done = extracted.len();
            if self.progress_every > 0 && done - last_report >= self.progress_every {
                info!("Featurized {}/{} structures", done, distinct.len());
                last_report = done;
            }
        }

        let mut kept: Vec<(usize, &FeatureVector)> = Vec::with_capacity(rows.len());
        let mut skipped_rows = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let slot = slots[row.key.as_str()];
            match &extracted[slot] {
                Ok(fv) => kept.push((i, fv)),
                Err(reason) => match self.on_unparsable {
                    UnparsablePolicy::Abort => {
                        return Err(AssayRankError::FeatureExtraction {
                            row: i,
                            structure: row.structure.clone(),
                            reason: reason.clone(),
                        });
                    }
                    UnparsablePolicy::Skip => {
                        warn!(row = i, key = %row.key, structure = %row.structure, %reason, "Skipping unparsable structure");
                        skipped_rows.push(i);
                    }
                },
            }
        }
        if !skipped_rows.is_empty() {
            warn!(skipped = skipped_rows.len(), "Rows dropped during feature extraction");
        }

        // Stable: ties keep input order.
        kept.sort_by_key(|(i, _)| rows[*i].qid);

        let matrix = RankingMatrix {
            labels: kept.iter().map(|(i, _)| rows[*i].relevance).collect(),
            qids: kept.iter().map(|(i, _)| rows[*i].qid).collect(),
            features: kept.into_iter().map(|(_, fv)| fv.clone()).collect(),
            n_columns: self.layout.len(),
            skipped_rows,
        };
        let (n, m) = matrix.shape();
        info!("Feature matrix shape: {} x {}", n, m);
        Ok(matrix)
    }
}

/// Write the column names, one per line, in column order.
pub fn write_feature_names(path: &Path, layout: &FeatureLayout) -> Result<()> {
    let file = File::create(path).map_err(|e| AssayRankError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for name in layout.feature_names() {
        writeln!(writer, "{name}").map_err(|e| AssayRankError::io(path, e))?;
    }
    writer.flush().map_err(|e| AssayRankError::io(path, e))
}
