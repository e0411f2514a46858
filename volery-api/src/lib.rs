//! # Volery Worker-Pool API
//!
//! Volery is an elastic worker-pool engine: a group of concurrently running
//! worker threads whose count can be grown or shrunk at runtime without
//! stopping in-flight work. This crate is the abstract contract layer: it
//! defines what a pool and a worker look like to their owner, independent of
//! any concrete engine.
//!
//! ## Core Components
//!
//! - **Pool**: the operations an owner drives a pool through: start, stop,
//!   resize, and the convergence query
//! - **Worker**: one unit of execution running a step function in a loop
//!   until signaled to stop
//! - **Worker Factory**: produces new, already-active workers on demand,
//!   given the pool's deregistration callback and an opaque coordinator value
//! - **Stop Callback**: the non-owning back-reference a worker uses to report
//!   its own termination to the pool, exactly once
//!
//! ## Lifecycle Contract
//!
//! A pool is running iff it has at least one active worker. Resizes are
//! serialized by a non-blocking single-writer guard: a caller that loses the
//! race is rejected with [`PoolError::Contended`] rather than queued. Resize
//! calls return before spawned threads finish starting or signaled threads
//! finish exiting; owners observe completion by polling
//! [`Pool::converged`].
//!
//! ## Module Organization
//!
//! - [`pool`]: the pool contract
//! - [`worker`]: worker identity, lifecycle and factory abstractions
//! - [`error`]: error types and handling

pub mod error;
pub mod pool;
pub mod worker;

pub use error::PoolError;
pub use pool::Pool;
pub use worker::{StopCallback, StopListener, Worker, WorkerFactory, WorkerId};
