//! The narrow constraint-solving capability the exact solver relies on.
//!
//! Boolean decision variables, reified OR, linear equality over booleans,
//! a linear minimization objective and a time-bounded solve. `SatBackend`
//! in `sat.rs` binds it to varisat.

use std::time::Duration;

use serde::Serialize;

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of a time-bounded solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Best objective value proven.
    Optimal,
    /// A solution exists but the budget ran out before proving it optimal.
    Feasible,
    /// Proven to have no solution.
    Infeasible,
    /// Nothing found within the budget.
    Unknown,
}

impl SolveStatus {
    /// Whether `value` reads a usable solution.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("solver error: {0}")]
    Solver(String),

    #[error("solver worker stopped without reporting a result")]
    Disconnected,

    #[error("{abandoned} timed-out searches are still running, try again later")]
    Busy { abandoned: usize },
}

pub trait ConstraintSolver {
    /// Add a fresh boolean decision variable.
    fn new_bool(&mut self) -> BoolVar;

    /// `target == max(inputs)`, i.e. `target <-> OR(inputs)`.
    /// An empty `inputs` forces `target` false.
    fn add_max_equality(&mut self, target: BoolVar, inputs: &[BoolVar]);

    /// `sum(vars) == rhs`.
    fn add_sum_equals(&mut self, vars: &[BoolVar], rhs: usize);

    /// Minimize `sum(vars)`. Replaces any earlier objective.
    fn minimize(&mut self, vars: &[BoolVar]);

    /// Solve within a wall-clock budget, keeping the best solution found.
    fn solve(&mut self, budget: Duration) -> Result<SolveStatus, BackendError>;

    /// Value of `var` in the last solution, if there is one.
    fn value(&self, var: BoolVar) -> Option<bool>;
}
