//! One generation call: parameters in, covering suite and report out.
//!
//! Every call owns its request. Nothing is shared between calls, so
//! concurrent requests cannot observe each other's parameters or results.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use pairwise_explore::solver::exact::{solve_exact_with, ExactConfig, ExactError};
use pairwise_explore::solver::greedy::{solve_greedy_with, GreedyConfig, GreedyError};
use pairwise_explore::solver::sat::SatBackend;
use pairwise_explore::solver::{
    analyze, build_pairs, CoverageReport, ExactOutcome, ExactStatus, GreedyOutcome, PairUniverse,
};
use pairwise_ir::{InputError, Pair, ParameterSet, TestSuite};

use crate::analytics::{GenerationTimer, SuiteAnalytics};
use crate::limits::{check_candidate_space, LimitViolation, SolveLimits};

// ── Request ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Proven-minimal suite from the constraint model, within the time budget.
    #[default]
    Exact,
    /// Fast heuristic suite, no minimality guarantee.
    Greedy,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Exact => write!(f, "exact"),
            Strategy::Greedy => write!(f, "greedy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected 'exact' or 'greedy')")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "cp-sat" | "cpsat" => Ok(Strategy::Exact),
            "greedy" => Ok(Strategy::Greedy),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Everything one generation needs. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub parameters: ParameterSet,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub limits: SolveLimits,
}

impl GenerateRequest {
    pub fn new(parameters: ParameterSet, strategy: Strategy) -> Self {
        Self {
            parameters,
            strategy,
            limits: SolveLimits::default(),
        }
    }
}

// ── Result ───────────────────────────────────────────────────────────

/// What the caller can rely on for the returned suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Exact solver proved the suite minimal.
    Optimal,
    /// Greedy suite covering every pair.
    Complete,
    /// Exact solver ran out of time; the suite covers every pair but may
    /// not be minimal.
    BestEffort,
    /// Exact solver found no suite: infeasible or out of time.
    NoSolutionFound,
    /// Greedy stopped with pairs still uncovered. The partial suite is
    /// returned together with the missing pairs.
    IncompleteCoverage,
}

impl Verdict {
    /// Whether the suite covers every pair.
    pub fn is_covering(self) -> bool {
        matches!(self, Verdict::Optimal | Verdict::Complete | Verdict::BestEffort)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Verdict::Optimal => "optimal suite found",
            Verdict::Complete => "suite covers all pairs",
            Verdict::BestEffort => "suite covers all pairs but may not be optimal (time budget reached)",
            Verdict::NoSolutionFound => "no solution found",
            Verdict::IncompleteCoverage => "suite does not cover all pairs",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub strategy: Strategy,
    pub verdict: Verdict,
    pub suite: TestSuite,
    /// Pairs the suite leaves uncovered. Empty for covering verdicts, the
    /// whole universe when no suite was found.
    pub uncovered: BTreeSet<Pair>,
    pub analytics: SuiteAnalytics,
    #[serde(skip)]
    pub universe: PairUniverse,
    #[serde(skip)]
    pub coverage: CoverageReport,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("limit exceeded: {0}")]
    Limit(#[from] LimitViolation),

    #[error("exact solver failed: {0}")]
    Exact(#[from] ExactError),

    #[error("greedy solver failed: {0}")]
    Greedy(#[from] GreedyError),

    #[error("generation task failed: {0}")]
    Task(String),
}

// ── Entry points ─────────────────────────────────────────────────────

/// Run one generation on the calling thread.
pub fn generate(request: &GenerateRequest) -> Result<Generation, GenerateError> {
    let timer = GenerationTimer::start();
    let parameters = &request.parameters;

    let universe = build_pairs(parameters)?;
    let candidates = check_candidate_space(&request.limits, parameters)?;

    info!(
        "generating with {} strategy: {} parameters, {} pairs, {} candidates",
        request.strategy,
        parameters.len(),
        universe.len(),
        candidates
    );

    let (suite, verdict) = match request.strategy {
        Strategy::Exact => {
            let config = ExactConfig {
                time_budget: request.limits.time_budget(),
                workers: request.limits.workers,
            };
            let outcome = solve_exact_with(&mut SatBackend::new(), parameters, &universe, &config)?;
            exact_verdict(outcome, &request.limits)
        }
        Strategy::Greedy => {
            let config = GreedyConfig {
                workers: request.limits.workers,
            };
            match solve_greedy_with(parameters, &universe, &config)? {
                GreedyOutcome::Complete(suite) => (suite, Verdict::Complete),
                GreedyOutcome::Incomplete { suite, .. } => (suite, Verdict::IncompleteCoverage),
            }
        }
    };

    let coverage = analyze(&suite, &universe, parameters);
    let uncovered = coverage.uncovered(&universe);

    let mut analytics = SuiteAnalytics::from_report(parameters, &suite, &coverage, universe.len());
    analytics.set_elapsed(timer.elapsed_secs());

    info!(
        "{} test cases cover {}/{} pairs in {:.2}s ({:?})",
        suite.len(),
        coverage.covered.len(),
        universe.len(),
        analytics.elapsed_secs,
        verdict
    );

    Ok(Generation {
        strategy: request.strategy,
        verdict,
        suite,
        uncovered,
        analytics,
        universe,
        coverage,
    })
}

fn exact_verdict(outcome: ExactOutcome, limits: &SolveLimits) -> (TestSuite, Verdict) {
    match (outcome.status, outcome.suite) {
        (ExactStatus::Optimal, Some(suite)) => (suite, Verdict::Optimal),
        (ExactStatus::Feasible, Some(suite)) => {
            warn!(
                "time budget of {}s reached, returning best suite found ({} tests)",
                limits.time_budget_secs,
                suite.len()
            );
            (suite, Verdict::BestEffort)
        }
        _ => {
            warn!("no suite found (solver status {:?})", outcome.solver_status);
            (TestSuite::new(), Verdict::NoSolutionFound)
        }
    }
}

/// Run one generation on tokio's blocking pool.
pub async fn generate_async(request: GenerateRequest) -> Result<Generation, GenerateError> {
    tokio::task::spawn_blocking(move || generate(&request))
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))?
}
