//! Drains a shared work queue with an elastic pool: start with one worker,
//! grow to the machine's core count under load, shrink back to one, stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use volery::{ElasticPool, Pool, QueueWorkerFactory, WorkQueue, default_pool_size, logging};

fn wait_until(pool: &impl Pool, what: &str) {
    while !pool.converged() {
        thread::sleep(Duration::from_millis(1));
    }
    println!("{what}: {} workers", pool.worker_count());
}

fn main() {
    logging::init_default();

    let queue = Arc::new(WorkQueue::new());
    let total = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&total);
    let factory = QueueWorkerFactory::new(Arc::clone(&queue), move |n: u64| {
        sink.fetch_add(n, Ordering::Relaxed);
    });

    let pool = ElasticPool::new(factory, ());
    pool.start().expect("pool failed to start");
    wait_until(&pool, "started");

    for n in 1..=100_000u64 {
        queue.push(n);
    }

    let cores = default_pool_size();
    pool.resize(cores).expect("resize failed");
    wait_until(&pool, "grown");

    while !queue.is_empty() {
        thread::sleep(Duration::from_millis(1));
    }

    pool.resize(1).expect("resize failed");
    wait_until(&pool, "shrunk");

    pool.stop().expect("pool failed to stop");
    wait_until(&pool, "stopped");

    println!("consumed sum: {}", total.load(Ordering::Relaxed));
}
