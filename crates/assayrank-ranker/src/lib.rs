//! assayrank-ranker — Relevance scoring and query assembly for ChEMBL assay exports.
//!
//! Pipeline: read export → per assay type {dedup → score} → shared document
//! index → qid tagging → concatenate → prune queries with no positive signal.

pub mod assembler;
pub mod chembl;
pub mod dataset;
pub mod query;
pub mod scorer;

pub use assembler::{assemble, AssembledDataset, AssemblyOptions, AssemblyReport};
pub use chembl::{read_assay_table, AssayRecord};
pub use dataset::{read_dataset, write_dataset, DatasetRow};
pub use query::{DocumentIndex, QueryAssigner, QueryId, TargetId};
pub use scorer::{score_ic50, score_inhibition, Exclusion, Score};
