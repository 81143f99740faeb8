//! Bounded rayon pools

/// Run `op` on a pool of `n_jobs` threads
///
/// Falls back to the global pool if a dedicated one cannot be built.
pub(crate) fn install<R, F>(n_jobs: usize, op: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(n_jobs.max(1))
        .build()
    {
        Ok(pool) => pool.install(op),
        Err(e) => {
            tracing::warn!("could not build a {n_jobs}-thread pool ({e}), using the global pool");
            op()
        }
    }
}
