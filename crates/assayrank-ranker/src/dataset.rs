//! Scored, qid-tagged dataset rows and their CSV form.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use assayrank_common::{AssayRankError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chembl::AssayRecord;
use crate::query::QueryId;

/// One retained (compound, document) pair.
///
/// Column names follow the ChEMBL export, then `relevance` and `qid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(rename = "CMPD_CHEMBLID")]
    pub compound_id: String,
    #[serde(rename = "DOC_CHEMBLID")]
    pub document_id: String,
    #[serde(rename = "CANONICAL_SMILES")]
    pub canonical_smiles: String,
    #[serde(rename = "STANDARD_TYPE")]
    pub standard_type: String,
    #[serde(rename = "RELATION")]
    pub relation: Option<String>,
    #[serde(rename = "STANDARD_VALUE")]
    pub standard_value: Option<f64>,
    #[serde(rename = "STANDARD_UNITS")]
    pub standard_units: Option<String>,
    pub relevance: f64,
    pub qid: QueryId,
}

impl DatasetRow {
    pub fn new(record: &AssayRecord, relevance: f64, qid: QueryId) -> Self {
        Self {
            compound_id: record.compound_id.clone(),
            document_id: record.document_id.clone(),
            canonical_smiles: record.canonical_smiles.clone(),
            standard_type: record.standard_type.clone(),
            relation: record.relation.clone(),
            standard_value: record.standard_value,
            standard_units: record.standard_units.clone(),
            relevance,
            qid,
        }
    }

    /// The raw assay columns, dropping relevance and qid.
    pub fn to_record(&self) -> AssayRecord {
        AssayRecord {
            compound_id: self.compound_id.clone(),
            document_id: self.document_id.clone(),
            canonical_smiles: self.canonical_smiles.clone(),
            standard_type: self.standard_type.clone(),
            relation: self.relation.clone(),
            standard_value: self.standard_value,
            standard_units: self.standard_units.clone(),
        }
    }
}

pub fn write_dataset(path: &Path, rows: &[DatasetRow]) -> Result<()> {
    let file = File::create(path).map_err(|e| AssayRankError::io(path, e))?;
    write_dataset_to(file, rows)?;
    info!(path = %path.display(), n_rows = rows.len(), "Wrote scored dataset");
    Ok(())
}

pub fn write_dataset_to<W: Write>(writer: W, rows: &[DatasetRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| AssayRankError::io("<dataset writer>", e))?;
    Ok(())
}

pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRow>> {
    let file = File::open(path).map_err(|e| AssayRankError::io(path, e))?;
    read_dataset_from(file)
}

pub fn read_dataset_from<R: Read>(reader: R) -> Result<Vec<DatasetRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
