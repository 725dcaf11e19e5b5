//! Dataset assembly: dedup → score → qid → concatenate → prune.
//!
//! Each assay subset is processed independently up to qid assignment. The
//! document index is built once over the documents that survive scoring in
//! both subsets, so an IC50 query and an inhibition query from the same paper
//! share their document component.

use std::collections::{BTreeMap, HashMap};

use assayrank_common::config::ScoringConfig;
use assayrank_common::{AssayType, DedupPolicy, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chembl::AssayRecord;
use crate::dataset::DatasetRow;
use crate::query::{DocumentIndex, QueryAssigner, QueryId, TargetId};
use crate::scorer::{score_record, Exclusion, Score};

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub ic50_threshold_um: f64,
    pub positive_epsilon: f64,
    pub dedup_policy: DedupPolicy,
    pub progress_every: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self::from(&ScoringConfig::default())
    }
}

impl From<&ScoringConfig> for AssemblyOptions {
    fn from(cfg: &ScoringConfig) -> Self {
        Self {
            ic50_threshold_um: cfg.ic50_threshold_um,
            positive_epsilon: cfg.positive_epsilon,
            dedup_policy: cfg.dedup_policy,
            progress_every: 1000,
        }
    }
}

/// Row accounting for one assay subset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubsetReport {
    pub rows: usize,
    pub duplicates_dropped: usize,
    pub excluded: BTreeMap<Exclusion, usize>,
    pub scored: usize,
}

impl SubsetReport {
    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }
}

/// Row and query accounting for one assembly run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    pub input_rows: usize,
    pub other_type_rows: usize,
    pub subsets: BTreeMap<AssayType, SubsetReport>,
    pub documents: usize,
    pub queries_pruned: usize,
    pub rows_pruned: usize,
    pub queries_retained: usize,
    pub rows_retained: usize,
}

impl AssemblyReport {
    pub fn log(&self) {
        for (assay, subset) in &self.subsets {
            info!(
                assay = %assay,
                rows = subset.rows,
                duplicates = subset.duplicates_dropped,
                excluded = subset.excluded_total(),
                scored = subset.scored,
                "Scored assay subset"
            );
        }
        info!(
            input_rows = self.input_rows,
            other_type_rows = self.other_type_rows,
            documents = self.documents,
            queries_retained = self.queries_retained,
            rows_retained = self.rows_retained,
            "Dataset assembled"
        );
        if self.queries_pruned > 0 {
            warn!(
                queries = self.queries_pruned,
                rows = self.rows_pruned,
                "Pruned queries with no positive relevance"
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub rows: Vec<DatasetRow>,
    pub report: AssemblyReport,
}

/// Keep one row per (compound, document) pair according to `policy`.
///
/// Returns the kept rows in first-occurrence order and the number dropped.
pub fn deduplicate<'a>(
    rows: &[&'a AssayRecord],
    policy: DedupPolicy,
    progress_every: usize,
) -> (Vec<&'a AssayRecord>, usize) {
    let mut kept: Vec<&AssayRecord> = Vec::with_capacity(rows.len());
    let mut position: HashMap<(&str, &str), usize> = HashMap::with_capacity(rows.len());

    for (i, record) in rows.iter().copied().enumerate() {
        if progress_every > 0 && i > 0 && i % progress_every == 0 {
            info!("{} / {} rows deduplicated", i, rows.len());
        }
        let key = (record.compound_id.as_str(), record.document_id.as_str());
        match position.get(&key) {
            None => {
                position.insert(key, kept.len());
                kept.push(record);
            }
            Some(&slot) => {
                if policy == DedupPolicy::PreferComplete
                    && !kept[slot].is_complete()
                    && record.is_complete()
                {
                    kept[slot] = record;
                }
            }
        }
    }

    let dropped = rows.len() - kept.len();
    (kept, dropped)
}

/// Assemble the scored, qid-tagged dataset for one target.
pub fn assemble(
    records: &[AssayRecord],
    target: TargetId,
    options: &AssemblyOptions,
) -> Result<AssembledDataset> {
    let mut report = AssemblyReport {
        input_rows: records.len(),
        ..Default::default()
    };

    let mut scored_subsets: Vec<(AssayType, Vec<(&AssayRecord, f64)>)> = Vec::new();
    let mut typed_rows = 0;

    for assay in AssayType::ALL {
        let subset: Vec<&AssayRecord> = records
            .iter()
            .filter(|r| AssayType::from_standard_type(&r.standard_type) == Some(assay))
            .collect();
        typed_rows += subset.len();

        let (unique, duplicates) = deduplicate(&subset, options.dedup_policy, options.progress_every);
        let mut subset_report = SubsetReport {
            rows: subset.len(),
            duplicates_dropped: duplicates,
            ..Default::default()
        };

        let mut scored = Vec::with_capacity(unique.len());
        for record in unique {
            match score_record(record, assay, options.ic50_threshold_um)? {
                Score::Relevant(relevance) => scored.push((record, relevance)),
                Score::Excluded(reason) => {
                    *subset_report.excluded.entry(reason).or_insert(0) += 1;
                }
            }
        }
        subset_report.scored = scored.len();
        debug!(assay = %assay, scored = scored.len(), "Subset scored");

        report.subsets.insert(assay, subset_report);
        scored_subsets.push((assay, scored));
    }
    report.other_type_rows = records.len() - typed_rows;

    let documents = DocumentIndex::build(
        scored_subsets
            .iter()
            .flat_map(|(_, rows)| rows.iter().map(|(r, _)| r.document_id.as_str())),
    );
    report.documents = documents.len();
    let assigner = QueryAssigner::new(target, documents);

    let mut rows = Vec::new();
    for (assay, scored) in &scored_subsets {
        for (record, relevance) in scored {
            let qid = assigner.assign(*assay, &record.document_id)?;
            rows.push(DatasetRow::new(record, *relevance, qid));
        }
    }

    let (rows, pruned_queries, pruned_rows) = prune_degenerate_queries(rows, options.positive_epsilon);
    report.queries_pruned = pruned_queries;
    report.rows_pruned = pruned_rows;
    report.rows_retained = rows.len();
    report.queries_retained = rows
        .iter()
        .map(|r| &r.qid)
        .collect::<std::collections::HashSet<_>>()
        .len();

    Ok(AssembledDataset { rows, report })
}

/// Drop every query whose best relevance is not above `epsilon`.
///
/// Returns the kept rows (order preserved), the number of dropped queries and dropped rows.
pub fn prune_degenerate_queries(
    rows: Vec<DatasetRow>,
    epsilon: f64,
) -> (Vec<DatasetRow>, usize, usize) {
    let mut max_by_qid: HashMap<QueryId, f64> = HashMap::new();
    for row in &rows {
        let entry = max_by_qid.entry(row.qid.clone()).or_insert(f64::NEG_INFINITY);
        if row.relevance > *entry {
            *entry = row.relevance;
        }
    }

    let dropped_queries = max_by_qid.values().filter(|max| !(**max > epsilon)).count();
    let before = rows.len();
    let kept: Vec<DatasetRow> = rows
        .into_iter()
        .filter(|row| max_by_qid.get(&row.qid).is_some_and(|max| *max > epsilon))
        .collect();
    let dropped_rows = before - kept.len();

    (kept, dropped_queries, dropped_rows)
}
