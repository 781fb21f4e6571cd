//! Greedy suite construction.
//!
//! Each round scans the full candidate space and appends the candidate that
//! covers the most still-uncovered pairs. Ties go to the candidate that
//! comes first in enumeration order, so the result is deterministic and
//! does not depend on the number of workers.
//!
//! Cost per round is O(|candidates| x pairs-per-candidate). No optimality
//! guarantee: the suite may be larger than the exact minimum.

use std::collections::BTreeSet;

use log::{debug, warn};
use rayon::prelude::*;

use pairwise_ir::{Pair, ParameterSet, TestSuite};

use super::candidates::{CandidateSpace, PairIndex, SpaceError};
use super::pairs::PairUniverse;
use super::worker_pool;

/// Configuration for the greedy solver.
#[derive(Debug, Clone)]
pub struct GreedyConfig {
    /// Threads used to score candidates. 1 = sequential scan.
    pub workers: usize,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Result of a greedy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreedyOutcome {
    /// Every universe pair is covered.
    Complete(TestSuite),
    /// No remaining candidate adds coverage but some pairs are still open.
    /// Only reachable when the universe holds pairs no candidate realizes.
    Incomplete {
        suite: TestSuite,
        uncovered: BTreeSet<Pair>,
    },
}

impl GreedyOutcome {
    pub fn suite(&self) -> &TestSuite {
        match self {
            GreedyOutcome::Complete(suite) => suite,
            GreedyOutcome::Incomplete { suite, .. } => suite,
        }
    }

    pub fn into_suite(self) -> TestSuite {
        match self {
            GreedyOutcome::Complete(suite) => suite,
            GreedyOutcome::Incomplete { suite, .. } => suite,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, GreedyOutcome::Complete(_))
    }
}

/// Errors for malformed input. Well-formed input never fails.
#[derive(Debug, thiserror::Error)]
pub enum GreedyError {
    #[error("candidate space error: {0}")]
    Space(#[from] SpaceError),
}

/// Run the greedy solver on the calling thread.
pub fn solve_greedy(
    parameters: &ParameterSet,
    pairs: &PairUniverse,
) -> Result<GreedyOutcome, GreedyError> {
    solve_greedy_with(parameters, pairs, &GreedyConfig::default())
}

pub fn solve_greedy_with(
    parameters: &ParameterSet,
    pairs: &PairUniverse,
    config: &GreedyConfig,
) -> Result<GreedyOutcome, GreedyError> {
    let space = CandidateSpace::new(parameters)?;
    let index = PairIndex::new(&space, pairs);
    let pool = worker_pool(config.workers);

    let mut covered = vec![false; index.len()];
    let mut covered_count = 0usize;
    let mut suite = TestSuite::new();
    let mut realized = Vec::new();

    while covered_count < index.len() {
        let best = match &pool {
            Some(pool) => pool.install(|| best_parallel(&space, &index, &covered)),
            None => best_sequential(&space, &index, &covered),
        };
        let Some((gain, candidate)) = best else {
            break;
        };

        realized.clear();
        index.realized_by(&space.decode(candidate), &mut realized);
        for &id in &realized {
            if !covered[id] {
                covered[id] = true;
                covered_count += 1;
            }
        }
        suite.push(space.candidate(candidate));

        debug!(
            "greedy round {}: candidate #{candidate} adds {gain}, {covered_count}/{} covered",
            suite.len(),
            index.len()
        );
    }

    if covered_count == index.len() {
        return Ok(GreedyOutcome::Complete(suite));
    }

    let uncovered: BTreeSet<Pair> = covered
        .iter()
        .enumerate()
        .filter(|(_, &c)| !c)
        .map(|(id, _)| index.pair(id).clone())
        .collect();
    warn!(
        "greedy stopped with {} of {} pairs uncoverable",
        uncovered.len(),
        index.len()
    );
    Ok(GreedyOutcome::Incomplete { suite, uncovered })
}

/// Number of uncovered pairs a candidate would newly cover.
fn gain(
    space: &CandidateSpace<'_>,
    index: &PairIndex,
    covered: &[bool],
    candidate: usize,
    digits: &mut [usize],
    realized: &mut Vec<usize>,
) -> usize {
    space.decode_into(candidate, digits);
    realized.clear();
    index.realized_by(digits, realized);
    realized.iter().filter(|&&id| !covered[id]).count()
}

/// First candidate with the strictly greatest positive gain.
fn best_sequential(
    space: &CandidateSpace<'_>,
    index: &PairIndex,
    covered: &[bool],
) -> Option<(usize, usize)> {
    let mut digits = vec![0; space.radices().len()];
    let mut realized = Vec::new();
    let mut best: Option<(usize, usize)> = None;

    for candidate in 0..space.size() {
        let g = gain(space, index, covered, candidate, &mut digits, &mut realized);
        if g > best.map_or(0, |(b, _)| b) {
            best = Some((g, candidate));
        }
    }
    best
}

/// Same selection as `best_sequential`, scored across the pool.
fn best_parallel(
    space: &CandidateSpace<'_>,
    index: &PairIndex,
    covered: &[bool],
) -> Option<(usize, usize)> {
    let width = space.radices().len();
    (0..space.size())
        .into_par_iter()
        .map_init(
            || (vec![0; width], Vec::new()),
            |(digits, realized), candidate| {
                (gain(space, index, covered, candidate, digits, realized), candidate)
            },
        )
        .filter(|&(g, _)| g > 0)
        .reduce_with(prefer)
}

/// Higher gain wins; equal gains go to the earlier candidate.
fn prefer(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
    if b.0 > a.0 || (b.0 == a.0 && b.1 < a.1) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::coverage::analyze;
    use crate::solver::pairs::build_pairs;
    use pairwise_ir::{Assignment, Candidate, Parameter};
    use test_log::test;

    fn three_binary() -> ParameterSet {
        ParameterSet::from_parameters(vec![
            Parameter::new("P1", ["a", "b"]),
            Parameter::new("P2", ["c", "d"]),
            Parameter::new("P3", ["e", "f"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_three_binary_reaches_full_coverage() {
        let set = three_binary();
        let universe = build_pairs(&set).unwrap();
        let outcome = solve_greedy(&set, &universe).unwrap();
        assert!(outcome.is_complete());
        assert!(outcome.suite().len() >= 4);

        let report = analyze(outcome.suite(), &universe, &set);
        assert!(report.is_complete(&universe));
    }

    #[test]
    fn test_first_pick_is_first_candidate() {
        // Every candidate covers 3 new pairs in round one; the tie goes to
        // the first in enumeration order.
        let set = three_binary();
        let universe = build_pairs(&set).unwrap();
        let outcome = solve_greedy(&set, &universe).unwrap();
        assert_eq!(outcome.suite()[0], Candidate::new(["a", "c", "e"]));
    }

    #[test]
    fn test_two_parameters_need_full_product() {
        let set = ParameterSet::from_parameters(vec![
            Parameter::new("P1", ["a", "b", "c"]),
            Parameter::new("P2", ["x", "y"]),
        ])
        .unwrap();
        let universe = build_pairs(&set).unwrap();
        let outcome = solve_greedy(&set, &universe).unwrap();
        assert_eq!(outcome.suite().len(), 6);
    }

    #[test]
    fn test_deterministic_across_runs_and_workers() {
        let set = ParameterSet::from_parameters(vec![
            Parameter::new("A", ["1", "2", "3"]),
            Parameter::new("B", ["4", "5", "6", "7"]),
            Parameter::new("C", ["8", "9"]),
            Parameter::new("D", ["x", "y", "z"]),
        ])
        .unwrap();
        let universe = build_pairs(&set).unwrap();

        let first = solve_greedy(&set, &universe).unwrap();
        let second = solve_greedy(&set, &universe).unwrap();
        let parallel = solve_greedy_with(&set, &universe, &GreedyConfig { workers: 4 }).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, parallel);
    }

    #[test]
    fn test_unrealizable_pair_is_reported_incomplete() {
        let set = three_binary();
        let mut pairs: Vec<Pair> = build_pairs(&set).unwrap().iter().cloned().collect();
        let ghost = Pair::new(Assignment::new("P1", "a"), Assignment::new("P2", "ghost")).unwrap();
        pairs.push(ghost.clone());
        let universe = PairUniverse::from_pairs(pairs);

        match solve_greedy(&set, &universe).unwrap() {
            GreedyOutcome::Incomplete { suite, uncovered } => {
                assert_eq!(uncovered.len(), 1);
                assert!(uncovered.contains(&ghost));
                let report = analyze(&suite, &universe, &set);
                assert_eq!(report.covered.len(), 12);
            }
            GreedyOutcome::Complete(_) => panic!("expected incomplete coverage"),
        }
    }

    #[test]
    fn test_prefer_breaks_ties_by_index() {
        assert_eq!(prefer((3, 5), (3, 2)), (3, 2));
        assert_eq!(prefer((3, 2), (3, 5)), (3, 2));
        assert_eq!(prefer((2, 0), (3, 9)), (3, 9));
    }
}
