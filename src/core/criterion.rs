//! Proof-of-work acceptance criteria
//!
//! A mining criterion is a pluggable predicate over a hex digest,
//! parameterized by a difficulty. The kind is a closed tagged enum so new
//! criteria (numeric threshold, leading zero bits) can be added without
//! touching block or ledger logic; an unrecognized kind string fails at
//! parse time instead of silently passing or failing blocks.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    /// The hex digest must start with `difficulty` literal '0' characters.
    LeadingZeros,
}

impl FromStr for CriterionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<CriterionKind> {
        match s {
            "leading_zeros" => Ok(CriterionKind::LeadingZeros),
            other => Err(LedgerError::Config(format!(
                "unknown mining criterion type: {other}"
            ))),
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionKind::LeadingZeros => write!(f, "leading_zeros"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningCriterion {
    #[serde(rename = "type")]
    pub kind: CriterionKind,
    pub difficulty: usize,
}

impl MiningCriterion {
    pub fn new(kind: CriterionKind, difficulty: usize) -> MiningCriterion {
        MiningCriterion { kind, difficulty }
    }

    pub fn leading_zeros(difficulty: usize) -> MiningCriterion {
        MiningCriterion::new(CriterionKind::LeadingZeros, difficulty)
    }

    /// Decide whether a block hash satisfies the proof-of-work requirement.
    pub fn check(&self, hash_hex: &str) -> bool {
        match self.kind {
            CriterionKind::LeadingZeros => {
                hash_hex.len() >= self.difficulty
                    && hash_hex.as_bytes()[..self.difficulty].iter().all(|&b| b == b'0')
            }
        }
    }
}
