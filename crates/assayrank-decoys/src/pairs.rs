use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use assayrank_common::{AssayRankError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One sampled decoy: the query it belongs to and its structure string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoyPair {
    pub qid: u64,
    pub structure: String,
}

/// Write headerless `qid,structure` rows.
pub fn write_decoys(path: &Path, pairs: &[DecoyPair]) -> Result<()> {
    let file = File::create(path).map_err(|e| AssayRankError::io(path, e))?;
    write_decoys_to(file, pairs)?;
    info!(path = %path.display(), rows = pairs.len(), "Wrote decoy table");
    Ok(())
}

pub fn write_decoys_to<W: Write>(writer: W, pairs: &[DecoyPair]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for pair in pairs {
        wtr.serialize(pair)?;
    }
    wtr.flush().map_err(|e| AssayRankError::io("<decoys>", e))?;
    Ok(())
}

pub fn read_decoys(path: &Path) -> Result<Vec<DecoyPair>> {
    let file = File::open(path).map_err(|e| AssayRankError::io(path, e))?;
    read_decoys_from(file)
}

pub fn read_decoys_from<R: Read>(reader: R) -> Result<Vec<DecoyPair>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut pairs = Vec::new();
    for result in rdr.deserialize() {
        pairs.push(result?);
    }
    Ok(pairs)
}
