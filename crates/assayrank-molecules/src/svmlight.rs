//! Ranking file (SVMlight / LETOR) output and qid read-back.
//!
//! One line per compound: `<label> qid:<qid> <index>:<value> ...` with
//! zero-based feature indices and only non-zero components. Rows must already
//! be grouped by qid.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use assayrank_common::{AssayRankError, Result};
use tracing::info;

use crate::builder::RankingMatrix;

/// Format a number the way `%.16g` would, without trailing zeros.
///
/// NaN and infinities are written `nan`, `inf` and `-inf`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let abs = v.abs();
    if v != 0.0 && (abs >= 1e16 || abs < 1e-4) {
        format!("{v:e}")
    } else {
        format!("{v}")
    }
}

pub fn write_ranking_file(path: &Path, matrix: &RankingMatrix) -> Result<()> {
    let file = File::create(path).map_err(|e| AssayRankError::io(path, e))?;
    write_ranking_rows(BufWriter::new(file), matrix).map_err(|e| AssayRankError::io(path, e))?;
    info!(path = %path.display(), rows = matrix.n_rows(), "Wrote ranking file");
    Ok(())
}

pub fn write_ranking_rows<W: Write>(mut writer: W, matrix: &RankingMatrix) -> std::io::Result<()> {
    for ((label, qid), features) in matrix
        .labels
        .iter()
        .zip(matrix.qids.iter())
        .zip(matrix.features.iter())
    {
        write!(writer, "{} qid:{}", format_value(*label), qid)?;
        for (index, value) in features.nonzero() {
            write!(writer, " {}:{}", index, format_value(value))?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// Read the qid of every row of a ranking file, in file order.
pub fn read_qids(path: &Path) -> Result<Vec<u64>> {
    let file = File::open(path).map_err(|e| AssayRankError::io(path, e))?;
    read_qids_from(file)
}

pub fn read_qids_from<R: Read>(reader: R) -> Result<Vec<u64>> {
    let mut qids = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| AssayRankError::RankingFile {
            line: line_no,
            reason: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let field = trimmed.split_whitespace().nth(1).ok_or_else(|| AssayRankError::RankingFile {
            line: line_no,
            reason: "missing qid field".into(),
        })?;
        let qid = field
            .strip_prefix("qid:")
            .and_then(|q| q.parse::<u64>().ok())
            .ok_or_else(|| AssayRankError::RankingFile {
                line: line_no,
                reason: format!("expected qid:<integer>, found {field:?}"),
            })?;
        qids.push(qid);
    }
    Ok(qids)
}
