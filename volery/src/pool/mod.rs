//! # Pool Core Module
//!
//! [`ElasticPool`] owns the set of live workers, enforces the
//! one-worker-minimum-while-running invariant, and serializes resize
//! operations without ever blocking queries.
//!
//! ## Synchronization Domains
//!
//! Two independent domains, reconciled only by the explicit convergence
//! check:
//! - lock-free atomics for the intended worker count and the resize guard,
//!   keeping `worker_count`/`is_running` non-blocking
//! - one short-held mutex around the worker registry
//!
//! They are deliberately not unified under one lock; that would reintroduce
//! blocking on read paths that must stay non-blocking.

mod registry;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use tracing::{debug, error, info};

use volery_api::{Pool, PoolError, StopCallback, StopListener, Worker, WorkerFactory, WorkerId};

use self::registry::WorkerRegistry;

/// Default worker count for callers sizing a pool to the machine.
pub fn default_pool_size() -> usize {
    num_cpus::get()
}

/// Configuration for an [`ElasticPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name used for worker thread names and log fields.
    pub name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "volery".to_string(),
        }
    }
}

/// RAII holder for the single-writer resize guard.
///
/// Acquisition is a compare-and-swap: a caller that finds the guard held is
/// rejected immediately, never queued. Release happens on drop, so every
/// exit path out of a guarded section (fault paths included) releases
/// the guard and can never wedge future resizes.
struct ResizeGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ResizeGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self { flag })
    }
}

impl Drop for ResizeGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// An elastic pool of worker threads.
///
/// The pool spawns workers through the factory supplied at construction,
/// passing each invocation the opaque `coordinator` value unchanged. It
/// exclusively owns the lifecycle of every worker it spawns: a worker never
/// outlives its removal from the registry plus its stop callback completing.
///
/// Resizes update the intended count optimistically and return before the
/// physical threads finish starting or exiting; poll
/// [`converged`](Pool::converged) to observe completion.
///
/// # Worker Thread Behavior
/// 1. Run the factory-supplied step function while active
/// 2. On a stop signal, finish the current step and exit the loop
/// 3. Deregister from the pool via the stop callback, then terminate
pub struct ElasticPool<C: Send + Sync + 'static> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C> {
    /// Intended worker count; `is_running() ⇔ effective > 0`. Mutated only
    /// while the resize guard is held.
    effective: AtomicUsize,

    /// Single-writer resize guard.
    resizing: AtomicBool,

    /// Live worker handles, keyed by identity.
    registry: WorkerRegistry,

    factory: Box<dyn WorkerFactory<C>>,

    /// Opaque context value passed unchanged to every factory invocation.
    coordinator: C,

    config: PoolConfig,
}

impl<C: Send + Sync + 'static> ElasticPool<C> {
    pub fn new(factory: impl WorkerFactory<C> + 'static, coordinator: C) -> Self {
        Self::with_config(factory, coordinator, PoolConfig::default())
    }

    pub fn with_config(
        factory: impl WorkerFactory<C> + 'static,
        coordinator: C,
        config: PoolConfig,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                effective: AtomicUsize::new(0),
                resizing: AtomicBool::new(false),
                registry: WorkerRegistry::new(),
                factory: Box::new(factory),
                coordinator,
                config,
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl<C: Send + Sync + 'static> fmt::Debug for ElasticPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticPool")
            .field("name", &self.inner.config.name)
            .field("effective", &self.inner.effective.load(Ordering::Relaxed))
            .field("registered", &self.inner.registry.len())
            .field("resizing", &self.inner.resizing.load(Ordering::Relaxed))
            .finish()
    }
}

impl<C: Send + Sync + 'static> PoolInner<C> {
    fn is_running(&self) -> bool {
        self.effective.load(Ordering::SeqCst) > 0
    }

    /// Grows the pool by up to `count` workers. Caller must hold the resize
    /// guard.
    ///
    /// Invokes the factory once per worker and launches each on its own
    /// named thread; stops early if the factory is exhausted or a thread
    /// fails to spawn. Started workers are appended to the registry in one
    /// batch and added to the intended count; the number actually started
    /// is returned.
    fn spawn_workers(self: &Arc<Self>, count: usize) -> usize {
        let mut batch: Vec<Arc<dyn Worker>> = Vec::with_capacity(count);
        while batch.len() < count {
            let callback =
                StopCallback::new(Arc::downgrade(self) as Weak<dyn StopListener>);
            let Some(worker) = self.factory.create(callback, &self.coordinator) else {
                debug!(
                    pool = %self.config.name,
                    started = batch.len(),
                    requested = count,
                    "worker factory exhausted"
                );
                break;
            };
            let id = worker.id();
            let runner = Arc::clone(&worker);
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", self.config.name, id))
                .spawn(move || runner.run());
            match spawned {
                // The join handle is dropped on purpose: the thread is
                // detached and removal is driven by the worker's own stop
                // notification, never by joining.
                Ok(_handle) => {
                    debug!(pool = %self.config.name, worker = %id, "worker launched");
                    batch.push(worker);
                }
                Err(e) => {
                    error!(pool = %self.config.name, error = %e, "failed to spawn worker thread");
                    break;
                }
            }
        }
        let started = batch.len();
        self.registry.append(batch);
        self.effective.fetch_add(started, Ordering::SeqCst);
        started
    }

    /// Shrinks the pool by signaling `count` active workers to stop. Caller
    /// must hold the resize guard.
    ///
    /// Signaling fewer workers than requested means the registry and the
    /// intended count have diverged, a fatal internal-consistency fault.
    /// Workers signaled before the shortfall was detected stay signaled,
    /// and the intended count is left untouched on that path.
    fn signal_workers(&self, count: usize) -> Result<(), PoolError> {
        let signaled = self.registry.signal_stop(count);
        if signaled != count {
            return Err(PoolError::RegistryDiverged {
                requested: count,
                signaled,
            });
        }
        self.effective.fetch_sub(count, Ordering::SeqCst);
        Ok(())
    }
}

impl<C: Send + Sync + 'static> StopListener for PoolInner<C> {
    fn on_worker_stopped(&self, id: WorkerId) -> Result<(), PoolError> {
        if !self.registry.remove(id) {
            return Err(PoolError::UnknownWorker(id));
        }
        debug!(pool = %self.config.name, worker = %id, "worker deregistered");
        Ok(())
    }
}

impl<C: Send + Sync + 'static> Pool for ElasticPool<C> {
    fn start(&self) -> Result<(), PoolError> {
        let inner = &self.inner;
        if inner.is_running() {
            return Ok(());
        }
        let _guard =
            ResizeGuard::try_acquire(&inner.resizing).ok_or(PoolError::Contended)?;
        // Re-check under the guard: a racing start may have won.
        if inner.is_running() {
            return Ok(());
        }
        if inner.spawn_workers(1) == 1 {
            info!(pool = %inner.config.name, "pool started");
            Ok(())
        } else {
            Err(PoolError::Exhausted)
        }
    }

    fn stop(&self) -> Result<(), PoolError> {
        let inner = &self.inner;
        if !inner.is_running() {
            return Ok(());
        }
        let _guard =
            ResizeGuard::try_acquire(&inner.resizing).ok_or(PoolError::Contended)?;
        if !inner.is_running() {
            return Ok(());
        }
        let target = inner.effective.load(Ordering::SeqCst);
        inner.signal_workers(target)?;
        info!(pool = %inner.config.name, workers = target, "pool stopping");
        Ok(())
    }

    fn resize(&self, workers: usize) -> Result<usize, PoolError> {
        let inner = &self.inner;
        let _guard =
            ResizeGuard::try_acquire(&inner.resizing).ok_or(PoolError::Contended)?;
        if !inner.is_running() {
            return Err(PoolError::NotRunning);
        }
        // The pool never reduces itself to zero workers; only stop() may.
        let target = workers.max(1);
        let current = inner.effective.load(Ordering::SeqCst);
        if target > current {
            inner.spawn_workers(target - current);
        } else if target < current {
            inner.signal_workers(current - target)?;
        }
        let now = inner.effective.load(Ordering::SeqCst);
        debug!(pool = %inner.config.name, requested = workers, effective = now, "pool resized");
        Ok(now)
    }

    fn worker_count(&self) -> usize {
        self.inner.effective.load(Ordering::SeqCst)
    }

    fn converged(&self) -> bool {
        self.inner.registry.len() == self.inner.effective.load(Ordering::SeqCst)
    }

    fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

/// A running pool must not be abandoned with live workers untracked: force
/// a full stop before release, retrying past transient guard contention.
impl<C: Send + Sync + 'static> Drop for ElasticPool<C> {
    fn drop(&mut self) {
        const STOP_ATTEMPTS: usize = 1000;
        for _ in 0..STOP_ATTEMPTS {
            match self.stop() {
                Ok(()) => return,
                Err(PoolError::Contended) => thread::yield_now(),
                Err(e) => {
                    error!(pool = %self.inner.config.name, error = %e, "failed to stop pool during teardown");
                    return;
                }
            }
        }
        error!(pool = %self.inner.config.name, "resize guard still contended during teardown");
    }
}
