//! Per-request limits and graceful degradation.
//!
//! Caps the exact solver's wall time, the number of scoring workers and the
//! size of the candidate space. When the time budget runs out the exact
//! solver hands back its best suite instead of failing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pairwise_ir::ParameterSet;

/// Limits for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveLimits {
    /// Wall-clock seconds the exact solver may search.
    pub time_budget_secs: u64,
    /// Threads used to score candidates and build the exact model.
    pub workers: usize,
    /// Largest Cartesian product either solver will enumerate.
    pub max_candidates: u64,
}

impl Default for SolveLimits {
    fn default() -> Self {
        Self {
            time_budget_secs: 300, // 5 minutes
            workers: 4,
            max_candidates: 1_000_000,
        }
    }
}

impl SolveLimits {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

/// A limit violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitViolation {
    CandidateSpaceTooLarge { size: u64, max: u64 },
    CandidateSpaceOverflow { max: u64 },
}

impl std::fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CandidateSpaceTooLarge { size, max } => {
                write!(f, "Too many candidate test cases ({size}, max {max})")
            }
            Self::CandidateSpaceOverflow { max } => {
                write!(f, "Too many candidate test cases (overflows u64, max {max})")
            }
        }
    }
}

impl std::error::Error for LimitViolation {}

/// Check the candidate space size before any solver runs.
/// Returns the size when it is within limits.
pub fn check_candidate_space(
    limits: &SolveLimits,
    parameters: &ParameterSet,
) -> Result<u64, LimitViolation> {
    let size = parameters
        .iter()
        .try_fold(1u64, |acc, p| acc.checked_mul(p.values.len() as u64))
        .ok_or(LimitViolation::CandidateSpaceOverflow {
            max: limits.max_candidates,
        })?;

    if size > limits.max_candidates {
        return Err(LimitViolation::CandidateSpaceTooLarge {
            size,
            max: limits.max_candidates,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_ir::Parameter;

    fn params(sizes: &[usize]) -> ParameterSet {
        ParameterSet::from_parameters(
            sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| Parameter::new(format!("P{i}"), (0..n).map(|v| format!("{i}-{v}"))))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_limits() {
        let limits = SolveLimits::default();
        assert_eq!(limits.time_budget_secs, 300);
        assert_eq!(limits.time_budget(), Duration::from_secs(300));
        assert_eq!(limits.workers, 4);
        assert_eq!(limits.max_candidates, 1_000_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let limits: SolveLimits = serde_json::from_str(r#"{"time_budget_secs": 5}"#).unwrap();
        assert_eq!(limits.time_budget_secs, 5);
        assert_eq!(limits.workers, 4);
    }

    #[test]
    fn test_candidate_space_within_limit() {
        assert_eq!(check_candidate_space(&SolveLimits::default(), &params(&[3, 4, 3, 4, 3])), Ok(432));
    }

    #[test]
    fn test_candidate_space_too_large() {
        let limits = SolveLimits {
            max_candidates: 100,
            ..Default::default()
        };
        assert_eq!(
            check_candidate_space(&limits, &params(&[5, 5, 5])),
            Err(LimitViolation::CandidateSpaceTooLarge { size: 125, max: 100 })
        );
    }

    #[test]
    fn test_limit_violation_display() {
        let v = LimitViolation::CandidateSpaceTooLarge { size: 125, max: 100 };
        assert!(v.to_string().contains("125, max 100"));
    }
}
