//! # Worker Base Module
//!
//! Provides [`StepWorker`], the concrete worker every pool in this crate
//! runs: a loop around a caller-supplied step function, driven by an atomic
//! active flag and terminated by a one-shot stop notification back to the
//! owning pool.
//!
//! ## Key Concepts
//! - Worker lifecycle: created active, drains after `stop()`, reports once
//! - Step execution: a zero-argument operation invoked each iteration
//! - Self-deregistration: the worker, not the pool, reports its own exit

pub mod queue;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

use volery_api::{StopCallback, Worker, WorkerId};

/// A worker that runs a caller-supplied step function in a loop.
///
/// The loop condition is the atomic `active` flag: `stop()` only clears the
/// flag, so an in-progress step always finishes before the worker drains.
/// After the loop exits the worker fires its stop callback exactly once and
/// its execution ends permanently; a `StepWorker` is never reused.
pub struct StepWorker {
    id: WorkerId,
    active: AtomicBool,
    callback: StopCallback,
    step: Box<dyn Fn() + Send + Sync>,
}

impl StepWorker {
    /// Creates an already-active worker around `step`.
    pub fn new(callback: StopCallback, step: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            id: WorkerId::new(),
            active: AtomicBool::new(true),
            callback,
            step: Box::new(step),
        }
    }
}

impl fmt::Debug for StepWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepWorker")
            .field("id", &self.id)
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish()
    }
}

impl Worker for StepWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn stop(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn run(&self) {
        while self.active.load(Ordering::Acquire) {
            (self.step)();
        }

        debug!(worker = %self.id, "worker loop exited, deregistering");

        // Exactly once, by this thread, after the loop. A rejected
        // notification means the registry never knew this worker or already
        // removed it; both break the pool's bookkeeping, so the thread dies
        // loudly rather than leaking the inconsistency.
        if let Err(e) = self.callback.notify(self.id) {
            error!(worker = %self.id, error = %e, "worker deregistration rejected");
            panic!("worker deregistration rejected: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex, Weak};
    use std::thread;
    use std::time::Duration;

    use volery_api::{PoolError, StopListener};

    struct Recording {
        stopped: Mutex<Vec<WorkerId>>,
        reject: bool,
    }

    impl Recording {
        fn new(reject: bool) -> Arc<Self> {
            Arc::new(Self {
                stopped: Mutex::new(Vec::new()),
                reject,
            })
        }

        fn callback(self: &Arc<Self>) -> StopCallback {
            StopCallback::new(Arc::downgrade(self) as Weak<dyn StopListener>)
        }
    }

    impl StopListener for Recording {
        fn on_worker_stopped(&self, id: WorkerId) -> Result<(), PoolError> {
            if self.reject {
                return Err(PoolError::UnknownWorker(id));
            }
            self.stopped.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[test]
    fn runs_steps_until_stopped_then_reports_once() {
        let listener = Recording::new(false);
        let steps = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&steps);
        let worker = Arc::new(StepWorker::new(listener.callback(), move || {
            counted.fetch_add(1, Ordering::Relaxed);
        }));
        let id = worker.id();

        let runner = Arc::clone(&worker);
        let handle = thread::spawn(move || runner.run());

        while steps.load(Ordering::Relaxed) < 10 {
            thread::yield_now();
        }
        assert!(worker.is_active());

        worker.stop();
        handle.join().unwrap();

        assert!(!worker.is_active());
        assert_eq!(*listener.stopped.lock().unwrap(), vec![id]);
    }

    #[test]
    fn stop_does_not_interrupt_an_in_progress_step() {
        let listener = Recording::new(false);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let worker = Arc::new(StepWorker::new(listener.callback(), move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::Release);
        }));

        let runner = Arc::clone(&worker);
        let handle = thread::spawn(move || runner.run());

        // Signal stop while the first step is still sleeping.
        thread::sleep(Duration::from_millis(10));
        worker.stop();
        handle.join().unwrap();

        assert!(finished.load(Ordering::Acquire));
    }

    #[test]
    fn rejected_deregistration_kills_the_worker_thread() {
        let listener = Recording::new(true);
        let worker = Arc::new(StepWorker::new(listener.callback(), thread::yield_now));

        let runner = Arc::clone(&worker);
        let handle = thread::spawn(move || runner.run());

        worker.stop();
        assert!(handle.join().is_err());
    }
}
