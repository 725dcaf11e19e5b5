//! Relevance scoring for raw assay measurements.
//!
//! Each assay type maps (relation, value, unit) to one of:
//! - a positive relevance (confirmed active, larger = better compound)
//! - zero (confirmed inactive)
//! - an exclusion (measurement cannot be compared; the row is dropped)
//!
//! Unknown relation operators are not guessed at: they abort the run.

use assayrank_common::assay::{NANOMOLAR, PERCENT};
use assayrank_common::{AssayRankError, AssayType, Relation, Result};
use serde::Serialize;

use crate::chembl::AssayRecord;

/// Outcome of scoring one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Relevant(f64),
    Excluded(Exclusion),
}

impl Score {
    pub fn relevance(self) -> Option<f64> {
        match self {
            Score::Relevant(r) => Some(r),
            Score::Excluded(_) => None,
        }
    }
}

/// Why a measurement was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Exclusion {
    /// Concrete unit that is not comparable (e.g. "ug.mL-1" for IC50).
    UnsupportedUnit,
    /// ">" bound below the inactivity threshold: the true value could be either side.
    AmbiguousLowerBound,
    /// "<" bound at or above the threshold (IC50) or any "<" inhibition reading.
    UninformativeUpperBound,
}

/// IC50 in micromolar → pIC50 (−log10 of the molar concentration).
///
/// Only defined for strictly positive concentrations.
pub fn ic50_um_to_pic50(ic50_um: f64) -> Result<f64> {
    if !(ic50_um > 0.0) || !ic50_um.is_finite() {
        return Err(AssayRankError::InvalidMeasurement(format!(
            "IC50 of {ic50_um} uM has no pIC50"
        )));
    }
    Ok(-ic50_um.log10() + 6.0)
}

fn malformed(relation: Option<&str>, value: Option<f64>, unit: Option<&str>) -> AssayRankError {
    AssayRankError::MalformedRelation {
        relation: relation.map(str::to_string),
        value,
        unit: unit.map(str::to_string),
    }
}

/// Score an IC50 measurement.
///
/// | relation | ic50 < threshold | ic50 >= threshold |
/// |----------|------------------|-------------------|
/// | `=`      | pIC50            | 0                 |
/// | `>`      | excluded         | 0                 |
/// | `<`      | pIC50            | excluded          |
///
/// A missing unit scores 0 regardless of relation. Units other than nM are excluded.
pub fn score_ic50(
    relation: Option<&str>,
    value: Option<f64>,
    unit: Option<&str>,
    threshold_um: f64,
) -> Result<Score> {
    let Some(unit_str) = unit else {
        return Ok(Score::Relevant(0.0));
    };
    if unit_str != NANOMOLAR {
        return Ok(Score::Excluded(Exclusion::UnsupportedUnit));
    }

    let rel = Relation::parse(relation).ok_or_else(|| malformed(relation, value, unit))?;

    let nm = match value {
        Some(v) if v.is_finite() => v,
        _ => {
            return Err(AssayRankError::InvalidMeasurement(format!(
                "IC50 in nM without a usable value (relation={relation:?}, value={value:?})"
            )))
        }
    };
    let ic50_um = nm * 1e-3;

    let score = match rel {
        Relation::Equal => {
            if ic50_um < threshold_um {
                Score::Relevant(ic50_um_to_pic50(ic50_um)?)
            } else {
                Score::Relevant(0.0)
            }
        }
        Relation::Greater => {
            if ic50_um >= threshold_um {
                Score::Relevant(0.0)
            } else {
                Score::Excluded(Exclusion::AmbiguousLowerBound)
            }
        }
        Relation::Less => {
            if ic50_um < threshold_um {
                Score::Relevant(ic50_um_to_pic50(ic50_um)?)
            } else {
                Score::Excluded(Exclusion::UninformativeUpperBound)
            }
        }
    };
    Ok(score)
}

/// Score a percent-inhibition measurement.
///
/// `=` and `>` give `max(value, 0)`; `<` is excluded. Only "%" units are
/// comparable, and a missing value with a "%" unit scores 0.
pub fn score_inhibition(
    relation: Option<&str>,
    value: Option<f64>,
    unit: Option<&str>,
) -> Result<Score> {
    if unit != Some(PERCENT) {
        return Ok(Score::Excluded(Exclusion::UnsupportedUnit));
    }
    let Some(v) = value.filter(|v| !v.is_nan()) else {
        return Ok(Score::Relevant(0.0));
    };

    match Relation::parse(relation) {
        Some(Relation::Equal) | Some(Relation::Greater) => Ok(Score::Relevant(v.max(0.0))),
        Some(Relation::Less) => Ok(Score::Excluded(Exclusion::UninformativeUpperBound)),
        None => Err(malformed(relation, value, unit)),
    }
}

/// Dispatch to the scorer matching `assay`.
pub fn score_record(record: &AssayRecord, assay: AssayType, ic50_threshold_um: f64) -> Result<Score> {
    let relation = record.relation.as_deref();
    let unit = record.standard_units.as_deref();
    match assay {
        AssayType::Ic50 => score_ic50(relation, record.standard_value, unit, ic50_threshold_um),
        AssayType::Inhibition => score_inhibition(relation, record.standard_value, unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relevant(score: Score) -> f64 {
        score.relevance().expect("expected a relevance, got an exclusion")
    }

    #[test]
    fn test_ic50_equal_below_threshold_is_pic50() {
        // 10 nM = 0.01 uM → pIC50 8
        let s = relevant(score_ic50(Some("="), Some(10.0), Some("nM"), 100.0).unwrap());
        assert!((s - 8.0).abs() < 1e-9);
        // 50 uM → 4.30
        let s = relevant(score_ic50(Some("="), Some(50_000.0), Some("nM"), 100.0).unwrap());
        assert!((s - (-(50.0f64).log10() + 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_ic50_equal_strictly_decreasing() {
        let values = [1.0, 10.0, 250.0, 1_000.0, 42_000.0, 99_999.0];
        let scores: Vec<f64> = values
            .iter()
            .map(|v| relevant(score_ic50(Some("="), Some(*v), Some("nM"), 100.0).unwrap()))
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "{:?}", scores);
        }
        assert!(scores.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_ic50_equal_at_threshold_is_zero() {
        assert_eq!(score_ic50(Some("="), Some(100_000.0), Some("nM"), 100.0).unwrap(), Score::Relevant(0.0));
        assert_eq!(score_ic50(Some("="), Some(500_000.0), Some("nM"), 100.0).unwrap(), Score::Relevant(0.0));
    }

    #[test]
    fn test_ic50_greater_than() {
        // 150 uM, inactive
        assert_eq!(score_ic50(Some(">"), Some(150_000.0), Some("nM"), 100.0).unwrap(), Score::Relevant(0.0));
        // exactly at the threshold still counts as inactive
        assert_eq!(score_ic50(Some(">"), Some(100_000.0), Some("nM"), 100.0).unwrap(), Score::Relevant(0.0));
        // 5 uM, could be anything below
        assert_eq!(
            score_ic50(Some(">"), Some(5_000.0), Some("nM"), 100.0).unwrap(),
            Score::Excluded(Exclusion::AmbiguousLowerBound)
        );
        // lower threshold flips the outcome
        assert_eq!(score_ic50(Some(">"), Some(5_000.0), Some("nM"), 1.0).unwrap(), Score::Relevant(0.0));
    }

    #[test]
    fn test_ic50_less_than() {
        let s = relevant(score_ic50(Some("<"), Some(100.0), Some("nM"), 100.0).unwrap());
        assert!((s - 7.0).abs() < 1e-9);
        assert_eq!(
            score_ic50(Some("<"), Some(200_000.0), Some("nM"), 100.0).unwrap(),
            Score::Excluded(Exclusion::UninformativeUpperBound)
        );
    }

    #[test]
    fn test_ic50_missing_unit_scores_zero() {
        assert_eq!(score_ic50(Some("="), None, None, 100.0).unwrap(), Score::Relevant(0.0));
        // relation is not inspected when the unit is missing
        assert_eq!(score_ic50(Some("~"), Some(3.0), None, 100.0).unwrap(), Score::Relevant(0.0));
    }

    #[test]
    fn test_ic50_other_unit_excluded() {
        assert_eq!(
            score_ic50(Some("="), Some(3.0), Some("ug.mL-1"), 100.0).unwrap(),
            Score::Excluded(Exclusion::UnsupportedUnit)
        );
        assert_eq!(
            score_ic50(Some("="), Some(3.0), Some("uM"), 100.0).unwrap(),
            Score::Excluded(Exclusion::UnsupportedUnit)
        );
    }

    #[test]
    fn test_ic50_unknown_relation_is_fatal() {
        let err = score_ic50(Some(">="), Some(3.0), Some("nM"), 100.0).unwrap_err();
        match err {
            AssayRankError::MalformedRelation { relation, value, unit } => {
                assert_eq!(relation.as_deref(), Some(">="));
                assert_eq!(value, Some(3.0));
                assert_eq!(unit.as_deref(), Some("nM"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(score_ic50(None, Some(3.0), Some("nM"), 100.0).is_err());
    }

    #[test]
    fn test_ic50_non_positive_concentration_is_fatal() {
        assert!(matches!(
            score_ic50(Some("="), Some(0.0), Some("nM"), 100.0),
            Err(AssayRankError::InvalidMeasurement(_))
        ));
        assert!(matches!(
            score_ic50(Some("<"), Some(-4.0), Some("nM"), 100.0),
            Err(AssayRankError::InvalidMeasurement(_))
        ));
        assert!(matches!(
            score_ic50(Some("="), None, Some("nM"), 100.0),
            Err(AssayRankError::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn test_pic50_transform() {
        assert!((ic50_um_to_pic50(1.0).unwrap() - 6.0).abs() < 1e-12);
        assert!((ic50_um_to_pic50(0.001).unwrap() - 9.0).abs() < 1e-9);
        assert!(ic50_um_to_pic50(f64::NAN).is_err());
    }

    #[test]
    fn test_inhibition_clamps_negative() {
        assert_eq!(score_inhibition(Some("="), Some(-20.0), Some("%")).unwrap(), Score::Relevant(0.0));
        assert_eq!(score_inhibition(Some("="), Some(55.0), Some("%")).unwrap(), Score::Relevant(55.0));
        assert_eq!(score_inhibition(Some(">"), Some(80.0), Some("%")).unwrap(), Score::Relevant(80.0));
    }

    #[test]
    fn test_inhibition_less_than_excluded() {
        assert_eq!(
            score_inhibition(Some("<"), Some(10.0), Some("%")).unwrap(),
            Score::Excluded(Exclusion::UninformativeUpperBound)
        );
    }

    #[test]
    fn test_inhibition_units() {
        assert_eq!(
            score_inhibition(Some("="), Some(10.0), Some("nM")).unwrap(),
            Score::Excluded(Exclusion::UnsupportedUnit)
        );
        assert_eq!(
            score_inhibition(Some("="), Some(10.0), None).unwrap(),
            Score::Excluded(Exclusion::UnsupportedUnit)
        );
        assert_eq!(score_inhibition(Some("="), None, Some("%")).unwrap(), Score::Relevant(0.0));
    }

    #[test]
    fn test_inhibition_unknown_relation_is_fatal() {
        assert!(matches!(
            score_inhibition(Some("~"), Some(10.0), Some("%")),
            Err(AssayRankError::MalformedRelation { .. })
        ));
    }
}
