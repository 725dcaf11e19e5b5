//! assayrank-decoys — Random decoy sampling from a large candidate library.
//!
//! Each query receives `sample_ratio` decoys per real compound, drawn without
//! replacement from a strided read of the candidate file.

pub mod candidates;
pub mod pairs;
pub mod sampler;

pub use candidates::{read_candidates, read_candidates_from, CandidatePool};
pub use pairs::{read_decoys, write_decoys, DecoyPair};
pub use sampler::{count_qids, count_qids_in_ranking_file, draw_indices, make_rng, sample_decoys, SamplingOptions};
