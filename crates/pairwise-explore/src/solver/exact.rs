//! Exact minimum covering suite via constraint optimization.
//!
//! Model:
//! - one inclusion variable per candidate of the full Cartesian product,
//! - per required pair, an auxiliary variable equal to the OR of the
//!   inclusion variables of every candidate realizing that pair,
//! - all auxiliary variables summed must equal the number of pairs,
//! - minimize the number of included candidates.
//!
//! Model size grows with the product of domain sizes, which bounds the
//! inputs this solver can handle in practice.

use std::time::Duration;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use pairwise_ir::{ParameterSet, TestSuite};

use super::backend::{BackendError, BoolVar, ConstraintSolver, SolveStatus};
use super::candidates::{CandidateSpace, PairIndex, SpaceError};
use super::pairs::PairUniverse;
use super::sat::SatBackend;
use super::worker_pool;

/// Default wall-clock budget for one exact solve.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct ExactConfig {
    pub time_budget: Duration,
    /// Threads used to build the model.
    pub workers: usize,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            workers: 1,
        }
    }
}

/// What the caller can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactStatus {
    /// The suite is a proven minimum.
    Optimal,
    /// The suite covers every pair but may not be minimal.
    Feasible,
    /// No suite: infeasible, or nothing found within the budget.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactOutcome {
    pub suite: Option<TestSuite>,
    pub status: ExactStatus,
    /// Raw status from the solving engine.
    pub solver_status: SolveStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum ExactError {
    #[error("candidate space error: {0}")]
    Space(#[from] SpaceError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Solve with the SAT backend under `time_budget`.
pub fn solve_exact(
    parameters: &ParameterSet,
    pairs: &PairUniverse,
    time_budget: Duration,
) -> Result<ExactOutcome, ExactError> {
    let config = ExactConfig {
        time_budget,
        ..ExactConfig::default()
    };
    solve_exact_with(&mut SatBackend::new(), parameters, pairs, &config)
}

/// Build the model into `solver` and solve it.
pub fn solve_exact_with<S: ConstraintSolver>(
    solver: &mut S,
    parameters: &ParameterSet,
    pairs: &PairUniverse,
    config: &ExactConfig,
) -> Result<ExactOutcome, ExactError> {
    let space = CandidateSpace::new(parameters)?;
    let index = PairIndex::new(&space, pairs);

    let include: Vec<BoolVar> = (0..space.size()).map(|_| solver.new_bool()).collect();
    let covering = covering_candidates(&space, &index, config.workers);

    let mut covered = Vec::with_capacity(covering.len());
    for candidates in &covering {
        let aux = solver.new_bool();
        let inputs: Vec<BoolVar> = candidates.iter().map(|&c| include[c]).collect();
        solver.add_max_equality(aux, &inputs);
        covered.push(aux);
    }
    solver.add_sum_equals(&covered, covered.len());
    solver.minimize(&include);

    info!(
        "exact model: {} candidates, {} pairs ({} realizable), budget {:?}",
        space.size(),
        index.len(),
        index.realizable(),
        config.time_budget
    );

    let solver_status = solver.solve(config.time_budget)?;

    let status = match solver_status {
        SolveStatus::Optimal => ExactStatus::Optimal,
        SolveStatus::Feasible => {
            warn!("found a covering suite, but it may not be optimal");
            ExactStatus::Feasible
        }
        SolveStatus::Infeasible | SolveStatus::Unknown => ExactStatus::NotFound,
    };

    let suite = if solver_status.has_solution() {
        Some(
            include
                .iter()
                .enumerate()
                .filter(|(_, &var)| solver.value(var) == Some(true))
                .map(|(c, _)| space.candidate(c))
                .collect(),
        )
    } else {
        None
    };

    Ok(ExactOutcome {
        suite,
        status,
        solver_status,
    })
}

/// For each pair id, the candidates realizing it, in enumeration order.
fn covering_candidates(
    space: &CandidateSpace<'_>,
    index: &PairIndex,
    workers: usize,
) -> Vec<Vec<usize>> {
    let width = space.radices().len();
    let realize = |candidate: usize| {
        let mut digits = vec![0; width];
        let mut ids = Vec::new();
        space.decode_into(candidate, &mut digits);
        index.realized_by(&digits, &mut ids);
        ids
    };

    let per_candidate: Vec<Vec<usize>> = match worker_pool(workers) {
        Some(pool) => pool.install(|| (0..space.size()).into_par_iter().map(realize).collect()),
        None => (0..space.size()).map(realize).collect(),
    };

    let mut covering = vec![Vec::new(); index.len()];
    for (candidate, ids) in per_candidate.into_iter().enumerate() {
        for id in ids {
            covering[id].push(candidate);
        }
    }
    covering
}
