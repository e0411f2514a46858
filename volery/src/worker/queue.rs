//! # Queue Worker Module
//!
//! The included pool specialization: workers that drain a shared work
//! queue. Each worker's step pops one item and applies the consumer to it,
//! yielding the scheduler when the queue is empty.
//!
//! This is a busy-polling design, not a blocking-queue one: it favors
//! minimal latency for incoming items over CPU efficiency when idle.
//! Callers that need efficiency under low load should use queue/consumer
//! pairs that block internally, or avoid overprovisioning idle workers.

use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_queue::SegQueue;

use volery_api::{StopCallback, Worker, WorkerFactory};

use super::StepWorker;

/// A shared work queue supporting non-blocking remove-one-or-empty.
///
/// # Thread Safety
/// - Lock-free internally (SegQueue)
/// - Safe for concurrent producers and consumers
pub struct WorkQueue<T> {
    queue: SegQueue<T>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Enqueues one item of work.
    pub fn push(&self, item: T) {
        self.queue.push(item);
    }

    /// Tries to dequeue one item.
    ///
    /// # Returns
    /// * `Some(item)` - an item ready to be consumed
    /// * `None` - the queue is empty
    pub fn try_pop(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Number of items currently queued. A snapshot; may change by the time
    /// the value is used.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("len", &self.queue.len())
            .finish()
    }
}

/// Worker factory producing queue-draining workers.
///
/// Every worker created by this factory shares the same queue and consumer;
/// growing the pool adds drain capacity, shrinking removes it, and items are
/// never lost across a resize because the queue outlives any individual
/// worker.
pub struct QueueWorkerFactory<T> {
    queue: Arc<WorkQueue<T>>,
    consumer: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> QueueWorkerFactory<T> {
    pub fn new(queue: Arc<WorkQueue<T>>, consumer: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            queue,
            consumer: Arc::new(consumer),
        }
    }

    pub fn queue(&self) -> &Arc<WorkQueue<T>> {
        &self.queue
    }
}

impl<T> fmt::Debug for QueueWorkerFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueWorkerFactory")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T, C> WorkerFactory<C> for QueueWorkerFactory<T>
where
    T: Send + 'static,
{
    fn create(&self, callback: StopCallback, _coordinator: &C) -> Option<Arc<dyn Worker>> {
        let queue = Arc::clone(&self.queue);
        let consumer = Arc::clone(&self.consumer);
        Some(Arc::new(StepWorker::new(callback, move || {
            match queue.try_pop() {
                Some(item) => consumer(item),
                // Cooperative hint to the scheduler, not a sleep.
                None => thread::yield_now(),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fifo_order() {
        let queue = WorkQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn factory_workers_drain_the_shared_queue() {
        use std::sync::Weak;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use volery_api::{PoolError, StopListener, WorkerId};

        struct Accepting;
        impl StopListener for Accepting {
            fn on_worker_stopped(&self, _id: WorkerId) -> Result<(), PoolError> {
                Ok(())
            }
        }

        let queue = Arc::new(WorkQueue::new());
        let consumed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&consumed);
        let factory = QueueWorkerFactory::new(Arc::clone(&queue), move |n: usize| {
            sink.fetch_add(n, Ordering::Relaxed);
        });

        for n in 1..=10 {
            queue.push(n);
        }

        let listener: Arc<dyn StopListener> = Arc::new(Accepting);
        let callback = StopCallback::new(Arc::downgrade(&listener) as Weak<dyn StopListener>);
        let worker = WorkerFactory::<()>::create(&factory, callback, &()).unwrap();
        assert!(worker.is_active());

        let runner = Arc::clone(&worker);
        let handle = thread::spawn(move || runner.run());
        while !queue.is_empty() {
            thread::yield_now();
        }
        worker.stop();
        handle.join().unwrap();

        assert_eq!(consumed.load(Ordering::Relaxed), 55);
    }
}
