//! Query id assignment.
//!
//! A query groups every scored record that shares a target, an assay type and
//! a source document. Its id is the string concatenation
//! `<target digit><assay code><document index>`, e.g. target 2, IC50,
//! document #17 → `"2117"`. The token is all digits so the ranking file can
//! carry it as an integer.
//!
//! Document indices come from the lexicographically sorted set of document
//! ids, starting at 1. They are reproducible for a given input but are not
//! stable across inputs: adding or removing a document shifts the indices of
//! every document sorted after it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use assayrank_common::{AssayRankError, AssayType, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Single-digit target identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetId(char);

impl TargetId {
    pub fn new(digit: char) -> Result<Self> {
        if digit.is_ascii_digit() {
            Ok(Self(digit))
        } else {
            Err(AssayRankError::TargetIdentifier(format!(
                "target identifier must be a single digit, got {digit:?}"
            )))
        }
    }

    /// Parse a target given on the command line.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(AssayRankError::TargetIdentifier(format!(
                "target identifier must be a single digit, got {raw:?}"
            ))),
        }
    }

    /// Extract the digit following `prefix` in the file name, e.g. `SIRT3_chembl.tsv` → 3.
    pub fn from_path(path: &Path, prefix: &str) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AssayRankError::TargetIdentifier(format!("no usable file name in {}", path.display()))
            })?;

        let pattern = Regex::new(&format!("{}([0-9])", regex::escape(prefix)))
            .map_err(|e| AssayRankError::Config(format!("bad target prefix {prefix:?}: {e}")))?;

        let caps = pattern.captures(name).ok_or_else(|| {
            AssayRankError::TargetIdentifier(format!(
                "file name {name:?} does not contain {prefix}<digit>; pass the target explicitly"
            ))
        })?;
        let digit = caps[1].chars().next().ok_or_else(|| {
            AssayRankError::TargetIdentifier(format!("empty target digit in {name:?}"))
        })?;
        Self::new(digit)
    }

    pub fn digit(self) -> char {
        self.0
    }
}

/// Document id → 1-based index over the sorted set of ids.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    indices: HashMap<String, usize>,
}

impl DocumentIndex {
    pub fn build<'a, I>(document_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sorted: BTreeSet<&str> = document_ids.into_iter().collect();
        let indices = sorted
            .into_iter()
            .enumerate()
            .map(|(i, doc)| (doc.to_string(), i + 1))
            .collect();
        Self { indices }
    }

    pub fn get(&self, document_id: &str) -> Option<usize> {
        self.indices.get(document_id).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Composite query id token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    pub fn compose(target: TargetId, assay: AssayType, document_index: usize) -> Self {
        let mut token = String::with_capacity(8);
        token.push(target.digit());
        token.push(assay.code());
        token.push_str(&document_index.to_string());
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer form used by the ranking file.
    pub fn numeric(&self) -> Result<u64> {
        self.0.parse().map_err(|_| {
            AssayRankError::TargetIdentifier(format!("query id {:?} is not an integer", self.0))
        })
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assigns query ids against one shared document index.
#[derive(Debug, Clone)]
pub struct QueryAssigner {
    target: TargetId,
    documents: DocumentIndex,
}

impl QueryAssigner {
    pub fn new(target: TargetId, documents: DocumentIndex) -> Self {
        Self { target, documents }
    }

    pub fn assign(&self, assay: AssayType, document_id: &str) -> Result<QueryId> {
        let index = self
            .documents
            .get(document_id)
            .ok_or_else(|| AssayRankError::UnknownDocument(document_id.to_string()))?;
        Ok(QueryId::compose(self.target, assay, index))
    }

    pub fn documents(&self) -> &DocumentIndex {
        &self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_path() {
        let t = TargetId::from_path(Path::new("data/SIRT3_chembl_activities.tsv"), "SIRT").unwrap();
        assert_eq!(t.digit(), '3');
    }

    #[test]
    fn test_target_from_path_without_prefix_fails() {
        let err = TargetId::from_path(Path::new("data/chembl_activities.tsv"), "SIRT").unwrap_err();
        assert!(matches!(err, AssayRankError::TargetIdentifier(_)));
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(TargetId::parse("6").unwrap().digit(), '6');
        assert!(TargetId::parse("12").is_err());
        assert!(TargetId::parse("a").is_err());
        assert!(TargetId::parse("").is_err());
    }

    #[test]
    fn test_document_index_is_sorted_and_one_based() {
        let index = DocumentIndex::build(["CHEMBL300", "CHEMBL1000", "CHEMBL200", "CHEMBL300"]);
        assert_eq!(index.len(), 3);
        // lexicographic, not numeric
        assert_eq!(index.get("CHEMBL1000"), Some(1));
        assert_eq!(index.get("CHEMBL200"), Some(2));
        assert_eq!(index.get("CHEMBL300"), Some(3));
        assert_eq!(index.get("CHEMBL999"), None);
    }

    #[test]
    fn test_document_index_ignores_input_order() {
        let a = DocumentIndex::build(["D2", "D1", "D3"]);
        let b = DocumentIndex::build(["D3", "D2", "D1"]);
        for doc in ["D1", "D2", "D3"] {
            assert_eq!(a.get(doc), b.get(doc));
        }
    }

    #[test]
    fn test_query_id_is_concatenated() {
        let target = TargetId::new('2').unwrap();
        let q = QueryId::compose(target, AssayType::Ic50, 17);
        assert_eq!(q.as_str(), "2117");
        assert_eq!(q.numeric().unwrap(), 2117);

        let q = QueryId::compose(target, AssayType::Inhibition, 3);
        assert_eq!(q.as_str(), "223");
    }

    #[test]
    fn test_assigner_shares_document_component() {
        let assigner = QueryAssigner::new(
            TargetId::new('1').unwrap(),
            DocumentIndex::build(["DOC_A", "DOC_B"]),
        );
        let ic50 = assigner.assign(AssayType::Ic50, "DOC_B").unwrap();
        let inhib = assigner.assign(AssayType::Inhibition, "DOC_B").unwrap();
        assert_eq!(ic50.as_str(), "112");
        assert_eq!(inhib.as_str(), "122");
        assert!(matches!(
            assigner.assign(AssayType::Ic50, "DOC_C"),
            Err(AssayRankError::UnknownDocument(_))
        ));
    }
}
