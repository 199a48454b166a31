//! Parallel processing utilities

use crate::error::{Result, ShoptrendError};

/// Run `op` on a rayon pool with `n_jobs` workers.
///
/// `None` runs on the global pool (all available processors); `Some(n)`
/// builds a dedicated pool of `n` threads for the duration of the call.
pub fn install<R, F>(n_jobs: Option<usize>, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match n_jobs {
        None => Ok(op()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n.max(1))
                .build()
                .map_err(|e| ShoptrendError::TrainingError(format!("Thread pool error: {}", e)))?;
            Ok(pool.install(op))
        }
    }
}

/// Worker count that `install` will use for `n_jobs`
pub fn effective_threads(n_jobs: Option<usize>) -> usize {
    n_jobs.map(|n| n.max(1)).unwrap_or_else(rayon::current_num_threads)
}
