//! varisat binding for `ConstraintSolver`.
//!
//! The model is compiled to CNF up front. Solving runs on a worker thread
//! that owns its own varisat `Solver`:
//! 1. Solve without a bound. UNSAT here means the model is infeasible.
//! 2. On each solution with cost `c`, report it, then add `sum <= c - 1`
//!    through a totalizer capped at the first cost.
//! 3. UNSAT under the tightened bound proves the last reported solution
//!    optimal.
//!
//! The caller waits on the result channel until the deadline. On expiry it
//! raises the cancel flag and keeps the best solution received; the worker
//! exits after its current SAT call returns. varisat cannot interrupt a call
//! in progress, so an abandoned worker may keep a core busy for a while.
//! At most `MAX_ABANDONED_SEARCHES` of them may be alive at once; further
//! solves are refused with `BackendError::Busy` until one exits.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use varisat::{ExtendFormula, Lit, Solver, Var};

use super::backend::{BackendError, BoolVar, ConstraintSolver, SolveStatus};
use super::cardinality::{totalizer, CnfClauses};

/// Timed-out workers allowed to run on before new solves are refused.
pub const MAX_ABANDONED_SEARCHES: usize = 4;

/// Workers cancelled by their caller but still inside a SAT call.
static ABANDONED_SEARCHES: AtomicUsize = AtomicUsize::new(0);

/// Number of timed-out search workers still running.
pub fn abandoned_searches() -> usize {
    ABANDONED_SEARCHES.load(Ordering::SeqCst)
}

/// SAT-backed constraint solver.
#[derive(Debug, Default)]
pub struct SatBackend {
    next_var: usize,
    clauses: CnfClauses,
    objective: Vec<Lit>,
    solution: Option<Vec<bool>>,
}

impl SatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decision and auxiliary variables allocated so far.
    pub fn num_vars(&self) -> usize {
        self.next_var
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn fresh(&mut self) -> Lit {
        let var = Var::from_index(self.next_var);
        self.next_var += 1;
        var.positive()
    }

    fn lit(var: BoolVar) -> Lit {
        Var::from_index(var.0).positive()
    }
}

impl ConstraintSolver for SatBackend {
    fn new_bool(&mut self) -> BoolVar {
        let lit = self.fresh();
        BoolVar(lit.var().index())
    }

    fn add_max_equality(&mut self, target: BoolVar, inputs: &[BoolVar]) {
        let t = Self::lit(target);

        // target -> OR(inputs)
        let mut forward = Vec::with_capacity(inputs.len() + 1);
        forward.push(!t);
        forward.extend(inputs.iter().map(|&v| Self::lit(v)));
        self.clauses.push(forward);

        // each input -> target
        for &input in inputs {
            self.clauses.push(vec![!Self::lit(input), t]);
        }
    }

    fn add_sum_equals(&mut self, vars: &[BoolVar], rhs: usize) {
        let lits: Vec<Lit> = vars.iter().map(|&v| Self::lit(v)).collect();

        if rhs > lits.len() {
            // Unsatisfiable: a fresh literal forced both ways.
            let contradiction = self.fresh();
            self.clauses.push(vec![contradiction]);
            self.clauses.push(vec![!contradiction]);
            return;
        }
        if rhs == lits.len() {
            self.clauses.extend(lits.iter().map(|&l| vec![l]));
            return;
        }
        if rhs == 0 {
            self.clauses.extend(lits.iter().map(|&l| vec![!l]));
            return;
        }

        let mut next_var = self.next_var;
        let mut fresh = || {
            let lit = Var::from_index(next_var).positive();
            next_var += 1;
            lit
        };
        let mut clauses = Vec::new();
        let outputs = totalizer(&lits, None, true, &mut fresh, &mut clauses);
        self.next_var = next_var;
        self.clauses.extend(clauses);
        self.clauses.push(vec![outputs[rhs - 1]]);
        self.clauses.push(vec![!outputs[rhs]]);
    }

    fn minimize(&mut self, vars: &[BoolVar]) {
        self.objective = vars.iter().map(|&v| Self::lit(v)).collect();
    }

    fn solve(&mut self, budget: Duration) -> Result<SolveStatus, BackendError> {
        self.solution = None;

        let abandoned = abandoned_searches();
        if abandoned >= MAX_ABANDONED_SEARCHES {
            return Err(BackendError::Busy { abandoned });
        }

        // Budgets past the clock's range mean no deadline.
        let deadline = Instant::now().checked_add(budget);

        info!(
            "SAT model: {} variables, {} clauses, objective over {} literals",
            self.next_var,
            self.clauses.len(),
            self.objective.len()
        );

        let job = SearchJob {
            num_vars: self.next_var,
            clauses: self.clauses.clone(),
            objective: self.objective.clone(),
        };
        let lease = Arc::new(SearchLease::default());
        let (tx, rx) = channel::unbounded();

        let worker_lease = Arc::clone(&lease);
        let handle = thread::Builder::new()
            .name("pairwise-sat".to_string())
            .spawn(move || {
                job.run(&tx, &worker_lease);
                worker_lease.finish(&ABANDONED_SEARCHES);
            })
            .map_err(|e| BackendError::Solver(e.to_string()))?;

        let mut best: Option<Vec<bool>> = None;
        let status = loop {
            let event = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match event {
                Ok(SearchEvent::Improved { values, cost }) => {
                    debug!("SAT search improved objective to {cost}");
                    best = Some(values);
                }
                Ok(SearchEvent::Exhausted) => {
                    break if best.is_some() {
                        SolveStatus::Optimal
                    } else {
                        SolveStatus::Infeasible
                    };
                }
                Ok(SearchEvent::Failed(message)) => {
                    return Err(BackendError::Solver(message));
                }
                Err(RecvTimeoutError::Timeout) => {
                    lease.abandon(&ABANDONED_SEARCHES);
                    warn!("SAT search hit its {budget:?} budget");
                    break if best.is_some() {
                        SolveStatus::Feasible
                    } else {
                        SolveStatus::Unknown
                    };
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(BackendError::Disconnected);
                }
            }
        };

        if matches!(status, SolveStatus::Optimal | SolveStatus::Infeasible) {
            // The worker has already sent its last event.
            let _ = handle.join();
        }

        self.solution = best;
        Ok(status)
    }

    fn value(&self, var: BoolVar) -> Option<bool> {
        self.solution.as_ref()?.get(var.0).copied()
    }
}

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const DONE: u8 = 2;

/// Shared between the caller and its worker thread.
///
/// Whichever side moves the state off `RUNNING` first wins: a worker that
/// finishes first was never abandoned, a caller that cancels first hands the
/// worker the job of releasing its slot in the abandoned count.
#[derive(Debug, Default)]
struct SearchLease {
    state: AtomicU8,
}

impl SearchLease {
    fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// Caller side: stop the worker and count it until it exits.
    fn abandon(&self, abandoned: &AtomicUsize) {
        abandoned.fetch_add(1, Ordering::SeqCst);
        if self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Worker already exited.
            abandoned.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Worker side, on exit.
    fn finish(&self, abandoned: &AtomicUsize) {
        if self
            .state
            .compare_exchange(RUNNING, DONE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            abandoned.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

enum SearchEvent {
    Improved { values: Vec<bool>, cost: usize },
    Exhausted,
    Failed(String),
}

/// Everything the worker thread needs, owned.
struct SearchJob {
    num_vars: usize,
    clauses: CnfClauses,
    objective: Vec<Lit>,
}

impl SearchJob {
    fn run(self, tx: &Sender<SearchEvent>, lease: &SearchLease) {
        let mut solver = Solver::new();

        // Register every model variable, even ones no clause mentions.
        for index in 0..self.num_vars {
            let var = Var::from_index(index);
            solver.add_clause(&[var.positive(), var.negative()]);
        }
        for clause in &self.clauses {
            solver.add_clause(clause);
        }

        let mut next_var = self.num_vars;
        let mut bound: Option<Vec<Lit>> = None;

        loop {
            // Only checked between SAT calls.
            if lease.is_cancelled() {
                return;
            }

            match solver.solve() {
                Ok(true) => {
                    let Some(model) = solver.model() else {
                        let _ = tx.send(SearchEvent::Failed(
                            "SAT but no model returned".to_string(),
                        ));
                        return;
                    };

                    let mut values = vec![false; self.num_vars];
                    for lit in &model {
                        if let Some(slot) = values.get_mut(lit.var().index()) {
                            *slot = lit.is_positive();
                        }
                    }
                    let cost = self
                        .objective
                        .iter()
                        .filter(|l| values[l.var().index()] == l.is_positive())
                        .count();

                    if tx.send(SearchEvent::Improved { values, cost }).is_err() {
                        return;
                    }
                    if cost == 0 {
                        let _ = tx.send(SearchEvent::Exhausted);
                        return;
                    }

                    // sum(objective) <= cost - 1
                    let outputs = bound.get_or_insert_with(|| {
                        let mut fresh = || {
                            let lit = Var::from_index(next_var).positive();
                            next_var += 1;
                            lit
                        };
                        let mut clauses = Vec::new();
                        let outputs =
                            totalizer(&self.objective, Some(cost), false, &mut fresh, &mut clauses);
                        for clause in &clauses {
                            solver.add_clause(clause);
                        }
                        outputs
                    });
                    solver.add_clause(&[!outputs[cost - 1]]);
                }
                Ok(false) => {
                    let _ = tx.send(SearchEvent::Exhausted);
                    return;
                }
                Err(e) => {
                    let _ = tx.send(SearchEvent::Failed(e.to_string()));
                    return;
                }
            }
        }
    }
}
