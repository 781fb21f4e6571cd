pub mod backend;
pub mod candidates;
pub mod cardinality;
pub mod coverage;
pub mod exact;
pub mod greedy;
pub mod pairs;
pub mod sat;

pub use coverage::{analyze, CoverageReport};
pub use exact::{solve_exact, ExactOutcome, ExactStatus};
pub use greedy::{solve_greedy, GreedyOutcome};
pub use pairs::{build_pairs, PairUniverse};

/// Dedicated rayon pool for `workers` threads.
///
/// `None` means score sequentially on the calling thread: either one
/// worker was requested or the pool could not be built.
pub(crate) fn worker_pool(workers: usize) -> Option<rayon::ThreadPool> {
    if workers <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pairwise-worker-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("could not start {workers} workers, scoring sequentially: {e}");
            None
        }
    }
}
