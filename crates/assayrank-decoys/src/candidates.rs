//! Strided reading of the candidate structure library.
//!
//! The library is a space-delimited `<structure> <identifier>` file, often far
//! too large to hold in memory. Only every `stride`-th data line is kept.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use assayrank_common::{AssayRankError, Result};
use tracing::info;

/// Structures retained from the candidate file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    pub structures: Vec<String>,
    /// Data lines seen, including the ones skipped by the stride.
    pub lines_read: usize,
}

impl CandidatePool {
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.structures.get(index).map(String::as_str)
    }
}

pub fn read_candidates(path: &Path, stride: usize, progress_every: usize) -> Result<CandidatePool> {
    let file = File::open(path).map_err(|e| AssayRankError::io(path, e))?;
    let pool = read_candidates_from(BufReader::new(file), stride, progress_every)
        .map_err(|e| match e {
            AssayRankError::Io { source, .. } => AssayRankError::io(path, source),
            other => other,
        })?;
    info!(
        path = %path.display(),
        lines = pool.lines_read,
        kept = pool.len(),
        stride,
        "Candidate library read"
    );
    Ok(pool)
}

/// Keep the first column of data lines 0, stride, 2·stride, ...
///
/// Blank lines and a leading `smiles ...` header do not count as data lines.
pub fn read_candidates_from<R: BufRead>(reader: R, stride: usize, progress_every: usize) -> Result<CandidatePool> {
    if stride == 0 {
        return Err(AssayRankError::Config("candidate read stride must be at least 1".into()));
    }

    let mut pool = CandidatePool::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssayRankError::io("<candidates>", e))?;
        let Some(structure) = line.split_whitespace().next() else {
            continue;
        };
        if line_no == 0 && structure.eq_ignore_ascii_case("smiles") {
            continue;
        }

        if pool.lines_read % stride == 0 {
            pool.structures.push(structure.to_string());
        }
        pool.lines_read += 1;

        if progress_every > 0 && pool.lines_read % (progress_every * stride) == 0 {
            info!("Read {} candidate lines ({} kept)", pool.lines_read, pool.len());
        }
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIBRARY: &str = "\
smiles zinc_id
C ZINC000001
CC ZINC000002
CCC ZINC000003

CCCC ZINC000004
CCCCC ZINC000005
c1ccccc1 ZINC000006
";

    #[test]
    fn test_stride_keeps_every_nth_data_line() {
        let pool = read_candidates_from(LIBRARY.as_bytes(), 2, 0).unwrap();
        assert_eq!(pool.structures, vec!["C", "CCC", "CCCCC"]);
        assert_eq!(pool.lines_read, 6);
    }

    #[test]
    fn test_stride_one_reads_everything() {
        let pool = read_candidates_from(LIBRARY.as_bytes(), 1, 0).unwrap();
        assert_eq!(pool.len(), 6);
        assert_eq!(pool.get(5), Some("c1ccccc1"));
    }

    #[test]
    fn test_headerless_file() {
        let pool = read_candidates_from("CCO ZINC1\nCCN ZINC2\n".as_bytes(), 10, 0).unwrap();
        assert_eq!(pool.structures, vec!["CCO"]);
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(matches!(
            read_candidates_from(LIBRARY.as_bytes(), 0, 0),
            Err(AssayRankError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_candidates(&dir.path().join("absent.smi"), 10, 0).unwrap_err();
        assert!(matches!(err, AssayRankError::Io { .. }));
    }
}
