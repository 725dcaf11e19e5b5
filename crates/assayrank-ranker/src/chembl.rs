//! ChEMBL bioactivity export reader.
//!
//! The export is tab-delimited with one activity per row. Only the seven
//! columns below are used; any others are ignored. Empty cells are missing
//! values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use assayrank_common::{AssayRankError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const COL_COMPOUND: &str = "CMPD_CHEMBLID";
pub const COL_DOCUMENT: &str = "DOC_CHEMBLID";
pub const COL_SMILES: &str = "CANONICAL_SMILES";
pub const COL_STANDARD_TYPE: &str = "STANDARD_TYPE";
pub const COL_RELATION: &str = "RELATION";
pub const COL_STANDARD_VALUE: &str = "STANDARD_VALUE";
pub const COL_STANDARD_UNITS: &str = "STANDARD_UNITS";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_COMPOUND,
    COL_DOCUMENT,
    COL_SMILES,
    COL_STANDARD_TYPE,
    COL_RELATION,
    COL_STANDARD_VALUE,
    COL_STANDARD_UNITS,
];

/// One activity row from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssayRecord {
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
}

impl AssayRecord {
    /// Both a value and a unit are present.
    pub fn is_complete(&self) -> bool {
        self.standard_value.is_some() && self.standard_units.is_some()
    }
}

/// Read the tab-delimited export at `path`.
pub fn read_assay_table(path: &Path) -> Result<Vec<AssayRecord>> {
    let file = File::open(path).map_err(|e| AssayRankError::io(path, e))?;
    info!(path = %path.display(), "Reading ChEMBL export");
    read_assay_records(file, b'\t')
}

/// Read assay rows from any reader, checking that every required column is present.
pub fn read_assay_records<R: Read>(reader: R, delimiter: u8) -> Result<Vec<AssayRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AssayRankError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let record: AssayRecord = row?;
        records.push(record);
    }
    debug!(n_rows = records.len(), "Parsed assay rows");
    Ok(records)
}
