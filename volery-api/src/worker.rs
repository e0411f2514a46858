use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;
use uuid::Uuid;

use crate::error::PoolError;

/// Identity of a worker within its owning pool.
///
/// The pool's registry is keyed by this value; it is also the correlation id
/// carried on worker log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(Uuid);

impl WorkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single unit of execution owned by a pool.
///
/// A worker is created already active, runs its step function in a loop on
/// its own thread, and reports its own termination through the pool's stop
/// callback. It is never reused after reporting stopped.
///
/// ## State Machine
///
/// Active → (stop signaled) → Draining → Reported → terminal. There is no
/// transition back to Active.
pub trait Worker: Send + Sync {
    fn id(&self) -> WorkerId;

    /// Clears the active flag. Cooperative: an in-progress step is never
    /// interrupted, so a long-running step delays convergence but is never
    /// forcibly aborted.
    fn stop(&self);

    fn is_active(&self) -> bool;

    /// Runs the worker loop on the current thread until the active flag is
    /// cleared, then fires the stop callback exactly once. Invoked once, by
    /// the pool, on the worker's dedicated thread.
    fn run(&self);
}

/// Receiver side of worker stop notifications, implemented by the pool.
pub trait StopListener: Send + Sync {
    /// Called by a worker thread on itself, exactly once, after its loop
    /// exits. An unregistered `id` is a contract violation and must be
    /// rejected rather than ignored, otherwise registry entries leak or
    /// counts desynchronize.
    fn on_worker_stopped(&self, id: WorkerId) -> Result<(), PoolError>;
}

/// Deregistration entry point handed to every worker at creation.
///
/// Holds a `Weak` back-reference to the owning pool so that workers never
/// keep the pool alive; if the pool is already gone when a worker drains,
/// the notification is a no-op.
#[derive(Clone)]
pub struct StopCallback {
    target: Weak<dyn StopListener>,
}

impl StopCallback {
    pub fn new(target: Weak<dyn StopListener>) -> Self {
        Self { target }
    }

    /// Delivers the one-shot stop notification for `id`.
    pub fn notify(&self, id: WorkerId) -> Result<(), PoolError> {
        match self.target.upgrade() {
            Some(listener) => listener.on_worker_stopped(id),
            None => {
                debug!(worker = %id, "pool released before worker deregistration");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for StopCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopCallback")
            .field("pool_alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// Produces workers for a pool.
///
/// The pool invokes the factory once per worker it needs, passing the stop
/// callback the new worker must report through and the opaque coordinator
/// value supplied at pool construction. Returning `None` signals factory
/// exhaustion: no further workers can be created. Exhaustion is not an
/// error; a resize reports the number actually started.
pub trait WorkerFactory<C>: Send + Sync {
    fn create(&self, callback: StopCallback, coordinator: &C) -> Option<Arc<dyn Worker>>;
}

impl<C, F> WorkerFactory<C> for F
where
    F: Fn(StopCallback, &C) -> Option<Arc<dyn Worker>> + Send + Sync,
{
    fn create(&self, callback: StopCallback, coordinator: &C) -> Option<Arc<dyn Worker>> {
        self(callback, coordinator)
    }
}
