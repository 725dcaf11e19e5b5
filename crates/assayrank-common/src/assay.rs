//! Assay vocabulary shared by the ranker and feature stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard unit string for nanomolar concentrations.
pub const NANOMOLAR: &str = "nM";

/// Standard unit string for percent readings.
pub const PERCENT: &str = "%";

/// Measurement types that carry a relevance signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssayType {
    Ic50,
    Inhibition,
}

impl AssayType {
    pub const ALL: [AssayType; 2] = [AssayType::Ic50, AssayType::Inhibition];

    /// Match a ChEMBL `STANDARD_TYPE` value. Other measurement types yield `None`.
    pub fn from_standard_type(standard_type: &str) -> Option<Self> {
        match standard_type {
            "IC50" => Some(AssayType::Ic50),
            "Inhibition" => Some(AssayType::Inhibition),
            _ => None,
        }
    }

    /// Digit used inside a composite query id.
    pub fn code(self) -> char {
        match self {
            AssayType::Ic50 => '1',
            AssayType::Inhibition => '2',
        }
    }

    pub fn standard_type(self) -> &'static str {
        match self {
            AssayType::Ic50 => "IC50",
            AssayType::Inhibition => "Inhibition",
        }
    }
}

impl fmt::Display for AssayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.standard_type())
    }
}

/// Relation operator attached to a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    Greater,
    Less,
}

impl Relation {
    /// Exact match on the ChEMBL operator; anything else (including a missing
    /// operator) is `None` and must be treated as a contract violation.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "=" => Some(Relation::Equal),
            ">" => Some(Relation::Greater),
            "<" => Some(Relation::Less),
            _ => None,
        }
    }
}
