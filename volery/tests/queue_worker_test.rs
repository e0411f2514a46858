//! Queue-draining specialization tests: shared queue, elastic drain
//! capacity, no items lost across resizes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use volery::{ElasticPool, Pool, QueueWorkerFactory, WorkQueue};

use test_helpers::wait_for;

#[test]
fn drains_preloaded_items() {
    let queue = Arc::new(WorkQueue::new());
    let sum = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&sum);
    let factory = QueueWorkerFactory::new(Arc::clone(&queue), move |n: u64| {
        sink.fetch_add(n, Ordering::Relaxed);
    });

    const ITEMS: u64 = 10_000;
    for n in 1..=ITEMS {
        queue.push(n);
    }

    let pool = ElasticPool::new(factory, ());
    pool.start().unwrap();
    pool.resize(4).unwrap();

    let expected = ITEMS * (ITEMS + 1) / 2;
    wait_for("queue to be fully consumed", || {
        sum.load(Ordering::Relaxed) == expected
    });
    assert!(queue.is_empty());

    pool.stop().unwrap();
    wait_for("pool to wind down", || pool.converged());
}

#[test]
fn no_items_lost_across_resizes() {
    const ITEMS: usize = 50_000;

    let queue = Arc::new(WorkQueue::new());
    let consumed = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&consumed);
    let factory = QueueWorkerFactory::new(Arc::clone(&queue), move |_n: usize| {
        sink.fetch_add(1, Ordering::Relaxed);
    });

    let pool = ElasticPool::new(factory, ());
    pool.start().unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for n in 0..ITEMS {
                queue.push(n);
                if n % 1024 == 0 {
                    thread::yield_now();
                }
            }
        })
    };

    // Resize repeatedly while the producer is feeding the queue.
    for &target in &[8, 2, 5, 1, 6] {
        pool.resize(target).unwrap();
        wait_for("resize to converge", || pool.converged());
    }

    producer.join().unwrap();
    wait_for("every item to be consumed", || {
        consumed.load(Ordering::Relaxed) == ITEMS
    });
    assert!(queue.is_empty());

    pool.stop().unwrap();
    wait_for("pool to wind down", || pool.converged());
}
