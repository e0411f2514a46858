use std::sync::{Arc, Mutex};

use volery_api::{Worker, WorkerId};

/// The live-worker registry: the only structure in the engine requiring
/// mutual exclusion.
///
/// The mutex is held only for list mutation and iteration, never across
/// thread spawn or join, keeping critical sections short. Removal is driven
/// by the worker's own stop notification, never by the pool polling thread
/// status.
pub(crate) struct WorkerRegistry {
    workers: Mutex<Vec<Arc<dyn Worker>>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Current registry size, compared against the intended count to answer
    /// convergence queries.
    pub fn len(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    /// Appends a batch of freshly spawned workers in one critical section.
    pub fn append(&self, batch: Vec<Arc<dyn Worker>>) {
        if batch.is_empty() {
            return;
        }
        self.workers.lock().unwrap().extend(batch);
    }

    /// Signals up to `limit` still-active workers to stop, skipping any
    /// already inactive (they are mid-teardown and must not be
    /// double-signaled). Returns the number actually signaled.
    pub fn signal_stop(&self, limit: usize) -> usize {
        let workers = self.workers.lock().unwrap();
        let mut signaled = 0;
        for worker in workers.iter() {
            if signaled == limit {
                break;
            }
            if worker.is_active() {
                worker.stop();
                signaled += 1;
            }
        }
        signaled
    }

    /// Removes the worker with `id`. Returns false if it was not registered.
    pub fn remove(&self, id: WorkerId) -> bool {
        let mut workers = self.workers.lock().unwrap();
        match workers.iter().position(|w| w.id() == id) {
            Some(index) => {
                workers.remove(index);
                true
            }
            None => false,
        }
    }
}
