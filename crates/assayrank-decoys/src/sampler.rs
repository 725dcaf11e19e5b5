//! Proportional per-query decoy sampling.

use std::collections::BTreeMap;
use std::path::Path;

use assayrank_common::config::DecoyConfig;
use assayrank_common::{AssayRankError, Result};
use assayrank_molecules::read_qids;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::candidates::CandidatePool;
use crate::pairs::DecoyPair;

#[derive(Debug, Clone, Copy)]
pub struct SamplingOptions {
    pub sample_ratio: usize,
    pub progress_every: usize,
}

impl From<&DecoyConfig> for SamplingOptions {
    fn from(config: &DecoyConfig) -> Self {
        Self {
            sample_ratio: config.sample_ratio,
            progress_every: 1000,
        }
    }
}

/// Seeded when a seed is given, otherwise from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Number of rows per qid.
pub fn count_qids(qids: &[u64]) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for &qid in qids {
        *counts.entry(qid).or_insert(0) += 1;
    }
    counts
}

pub fn count_qids_in_ranking_file(path: &Path) -> Result<BTreeMap<u64, usize>> {
    let qids = read_qids(path)?;
    let counts = count_qids(&qids);
    info!(rows = qids.len(), queries = counts.len(), "Read qids from ranking file");
    Ok(counts)
}

/// Draw `n_compound * ratio` distinct indices below `pool_size`.
///
/// Asking for more than the pool holds is an error, never a truncation.
pub fn draw_indices<R: Rng + ?Sized>(
    rng: &mut R,
    qid: u64,
    n_compound: usize,
    ratio: usize,
    pool_size: usize,
) -> Result<Vec<usize>> {
    let requested = n_compound.saturating_mul(ratio);
    if requested > pool_size {
        return Err(AssayRankError::InsufficientCandidates {
            qid,
            requested,
            available: pool_size,
        });
    }
    Ok(rand::seq::index::sample(rng, pool_size, requested).into_vec())
}

/// Sample decoys for every query, in ascending qid order.
pub fn sample_decoys<R: Rng + ?Sized>(
    rng: &mut R,
    counts: &BTreeMap<u64, usize>,
    pool: &CandidatePool,
    options: SamplingOptions,
) -> Result<Vec<DecoyPair>> {
    // Fail before drawing anything if any query cannot be served.
    if let Some((&qid, &n)) = counts
        .iter()
        .find(|(_, &n)| n.saturating_mul(options.sample_ratio) > pool.len())
    {
        return Err(AssayRankError::InsufficientCandidates {
            qid,
            requested: n.saturating_mul(options.sample_ratio),
            available: pool.len(),
        });
    }

    let mut pairs = Vec::new();
    for (i, (&qid, &n_compound)) in counts.iter().enumerate() {
        let indices = draw_indices(rng, qid, n_compound, options.sample_ratio, pool.len())?;
        debug!(qid, n_compound, drawn = indices.len(), "Sampled decoys");
        pairs.extend(indices.into_iter().map(|ind| DecoyPair {
            qid,
            structure: pool.structures[ind].clone(),
        }));

        if options.progress_every > 0 && (i + 1) % options.progress_every == 0 {
            info!("Sampled {}/{} queries", i + 1, counts.len());
        }
    }
    info!(queries = counts.len(), decoys = pairs.len(), "Decoy sampling complete");
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool(n: usize) -> CandidatePool {
        CandidatePool {
            structures: (0..n).map(|i| format!("C{i}")).collect(),
            lines_read: n,
        }
    }

    #[test]
    fn test_pool_too_small_is_fatal() {
        let mut rng = make_rng(Some(1));
        let err = draw_indices(&mut rng, 2112, 3, 10, 25).unwrap_err();
        match err {
            AssayRankError::InsufficientCandidates { qid, requested, available } => {
                assert_eq!(qid, 2112);
                assert_eq!(requested, 30);
                assert_eq!(available, 25);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_draws_distinct_indices() {
        let mut rng = make_rng(Some(1));
        let indices = draw_indices(&mut rng, 2112, 3, 10, 100).unwrap();
        assert_eq!(indices.len(), 30);
        let distinct: HashSet<usize> = indices.iter().copied().collect();
        assert_eq!(distinct.len(), 30);
        assert!(indices.iter().all(|&i| i < 100));
    }

    #[test]
    fn test_exact_pool_size_is_allowed() {
        let mut rng = make_rng(Some(3));
        let mut indices = draw_indices(&mut rng, 1, 2, 5, 10).unwrap();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_count_qids() {
        let counts = count_qids(&[2112, 2112, 1121, 2112]);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(1121, 1), (2112, 3)]);
    }

    #[test]
    fn test_sample_is_proportional_and_ordered() {
        let counts = count_qids(&[7, 3, 7]);
        let options = SamplingOptions { sample_ratio: 4, progress_every: 0 };
        let mut rng = make_rng(Some(42));
        let pairs = sample_decoys(&mut rng, &counts, &pool(20), options).unwrap();

        assert_eq!(pairs.len(), 12);
        assert!(pairs[..4].iter().all(|p| p.qid == 3));
        assert!(pairs[4..].iter().all(|p| p.qid == 7));
        let for_seven: HashSet<&str> = pairs[4..].iter().map(|p| p.structure.as_str()).collect();
        assert_eq!(for_seven.len(), 8);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let counts = count_qids(&[1, 2, 2]);
        let options = SamplingOptions { sample_ratio: 3, progress_every: 0 };
        let a = sample_decoys(&mut make_rng(Some(9)), &counts, &pool(50), options).unwrap();
        let b = sample_decoys(&mut make_rng(Some(9)), &counts, &pool(50), options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_oversized_query_fails_before_sampling() {
        let counts = count_qids(&[1, 2, 2, 2]);
        let options = SamplingOptions { sample_ratio: 2, progress_every: 0 };
        let err = sample_decoys(&mut make_rng(Some(0)), &counts, &pool(5), options).unwrap_err();
        assert!(matches!(err, AssayRankError::InsufficientCandidates { qid: 2, requested: 6, available: 5 }));
    }
}
