//! assayrank-molecules — Molecular feature vectors and ranking-file output.
//!
//! Feature extraction itself is external (an RDKit helper process); this crate
//! fixes the column layout, joins features onto labeled rows and writes the
//! SVMlight ranking file.

pub mod builder;
pub mod features;
pub mod rdkit;
pub mod svmlight;

pub use builder::{write_feature_names, FeatureBuilder, LabeledStructure, RankingMatrix};
pub use features::{
    Extraction, FeatureExtractor, FeatureLayout, FeatureVector, MockFeatureExtractor, RawFeatures,
};
pub use rdkit::RdkitExtractor;
pub use svmlight::{format_value, read_qids, write_ranking_file};
