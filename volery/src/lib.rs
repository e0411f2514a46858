// Volery Elastic Worker-Pool Engine
//
// This crate implements the volery-api contract: a pool of OS worker
// threads that can be grown or shrunk at runtime without stopping in-flight
// work, with at least one worker guaranteed active while the pool runs.

pub mod logging;
pub mod pool;
pub mod worker;

// Re-export commonly used types
pub use pool::{ElasticPool, PoolConfig, default_pool_size};
pub use worker::StepWorker;
pub use worker::queue::{QueueWorkerFactory, WorkQueue};
pub use volery_api::{Pool, PoolError, StopCallback, StopListener, Worker, WorkerFactory, WorkerId};
