use crate::error::PoolError;

/// The operations a pool exposes to its owner.
///
/// ## Lifecycle
///
/// A pool is running iff its worker count is greater than zero. `start`
/// brings up exactly one worker; `resize` grows or shrinks from there; only
/// `stop` takes the pool back to zero.
///
/// ## Convergence
///
/// `resize` and `stop` update the intended worker count optimistically and
/// return before spawned threads finish starting or signaled threads finish
/// exiting. [`converged`](Pool::converged) is the only way to observe that
/// the most recent change has fully taken effect; callers poll it rather
/// than being blocked.
///
/// ## Concurrency
///
/// All operations may be invoked from many owner threads concurrently. None
/// of them block: at most one resize is in flight pool-wide, and a caller
/// that loses the race gets [`PoolError::Contended`] immediately instead of
/// waiting. [`worker_count`](Pool::worker_count) and
/// [`is_running`](Pool::is_running) are lock-free reads and may observe the
/// optimistic target of a resize still in progress.
pub trait Pool {
    /// Starts the pool with exactly one worker. Idempotent: returns `Ok`
    /// immediately if already running.
    ///
    /// # Errors
    /// [`PoolError::Contended`] if a resize is in flight,
    /// [`PoolError::Exhausted`] if the factory could not produce the first
    /// worker (the pool stays not-running).
    fn start(&self) -> Result<(), PoolError>;

    /// Signals every registered worker to stop and takes the worker count
    /// to zero. Idempotent: returns `Ok` immediately if not running. Waits
    /// only for the signaling, not for thread termination.
    fn stop(&self) -> Result<(), PoolError>;

    /// Requests the pool reach `workers` total workers and returns the new
    /// intended count. `0` is coerced to `1`: the pool never reduces itself
    /// to zero workers while running.
    ///
    /// Factory exhaustion during growth is not an error; the count actually
    /// started is reported.
    fn resize(&self, workers: usize) -> Result<usize, PoolError>;

    /// The current intended worker count. Lock-free.
    fn worker_count(&self) -> usize;

    /// True iff the live worker registry has caught up with the intended
    /// count, i.e. the most recent resize or stop has fully taken effect.
    fn converged(&self) -> bool;

    /// True iff the pool has at least one active worker. Lock-free.
    fn is_running(&self) -> bool;
}
