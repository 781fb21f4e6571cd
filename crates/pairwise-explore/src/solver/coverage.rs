//! Coverage accounting for an ordered suite.
//!
//! A reporting pass only: it walks the suite in order, collects the
//! universe pairs each test case realizes and records how many of them
//! were new at that position. It never influences generation.

use std::collections::BTreeSet;

use serde::Serialize;

use pairwise_ir::{Candidate, Pair, ParameterSet};

use super::pairs::PairUniverse;

/// Cumulative and per-test-case coverage of a suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    /// Pairs covered by at least one test case.
    pub covered: BTreeSet<Pair>,
    /// Universe pairs realized by each test case, in suite order.
    pub per_test_pairs: Vec<BTreeSet<Pair>>,
    /// Pairs first covered at each position.
    pub new_counts: Vec<usize>,
}

impl CoverageReport {
    /// Whether every universe pair is covered.
    pub fn is_complete(&self, universe: &PairUniverse) -> bool {
        universe.iter().all(|p| self.covered.contains(p))
    }

    pub fn uncovered(&self, universe: &PairUniverse) -> BTreeSet<Pair> {
        universe
            .iter()
            .filter(|p| !self.covered.contains(*p))
            .cloned()
            .collect()
    }

    /// Running total of covered pairs after each test case.
    pub fn cumulative(&self) -> Vec<usize> {
        self.new_counts
            .iter()
            .scan(0, |total, n| {
                *total += n;
                Some(*total)
            })
            .collect()
    }
}

/// Universe pairs realized by one candidate.
///
/// Every unordered combination of the candidate's own assignments is a
/// potential pair; only those present in the universe count.
pub fn candidate_pairs(
    candidate: &Candidate,
    parameters: &ParameterSet,
    universe: &PairUniverse,
) -> BTreeSet<Pair> {
    let assignments: Vec<_> = candidate.assignments(parameters).collect();
    let mut pairs = BTreeSet::new();
    for i in 0..assignments.len() {
        for j in (i + 1)..assignments.len() {
            if let Some(pair) = Pair::new(assignments[i].clone(), assignments[j].clone()) {
                if universe.contains(&pair) {
                    pairs.insert(pair);
                }
            }
        }
    }
    pairs
}

/// Compute cumulative coverage and marginal gains for a suite.
pub fn analyze(
    suite: &[Candidate],
    universe: &PairUniverse,
    parameters: &ParameterSet,
) -> CoverageReport {
    let mut report = CoverageReport::default();

    for candidate in suite {
        let before = report.covered.len();
        let pairs = candidate_pairs(candidate, parameters, universe);
        report.covered.extend(pairs.iter().cloned());
        report.new_counts.push(report.covered.len() - before);
        report.per_test_pairs.push(pairs);
    }

    report
}
