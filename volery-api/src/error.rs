use thiserror::Error;

use crate::worker::WorkerId;

/// Errors surfaced by pool operations.
///
/// Two families share this enum:
///
/// - **Usage errors** ([`NotRunning`](PoolError::NotRunning),
///   [`Contended`](PoolError::Contended),
///   [`Exhausted`](PoolError::Exhausted)) are recoverable; the caller decides
///   whether and when to retry. `Contended` is a distinct variant so that
///   load-balancing callers can tell resize contention apart from misuse.
/// - **Internal-consistency faults**
///   ([`RegistryDiverged`](PoolError::RegistryDiverged),
///   [`UnknownWorker`](PoolError::UnknownWorker)) indicate the worker
///   registry and the pool's atomic count have diverged, a programming
///   error in the engine or a misbehaving worker, not a transient condition.
///   They abort only the offending call and are never retried internally.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("pool is not running")]
    NotRunning,
    #[error("another resize is already in progress")]
    Contended,
    #[error("worker factory produced no worker")]
    Exhausted,
    #[error("worker registry diverged: requested {requested} stop signals, delivered {signaled}")]
    RegistryDiverged { requested: usize, signaled: usize },
    #[error("stop notification from unregistered worker {0}")]
    UnknownWorker(WorkerId),
    #[error("internal pool error: {0}")]
    Other(#[from] anyhow::Error),
}

impl PoolError {
    /// True for faults that indicate a broken engine invariant rather than
    /// a recoverable usage error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PoolError::RegistryDiverged { .. } | PoolError::UnknownWorker(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_not_fatal() {
        assert!(!PoolError::NotRunning.is_fatal());
        assert!(!PoolError::Contended.is_fatal());
        assert!(!PoolError::Exhausted.is_fatal());
    }

    #[test]
    fn consistency_faults_are_fatal() {
        let diverged = PoolError::RegistryDiverged {
            requested: 3,
            signaled: 2,
        };
        assert!(diverged.is_fatal());
        assert!(PoolError::UnknownWorker(WorkerId::new()).is_fatal());
    }

    #[test]
    fn diverged_display_names_both_counts() {
        let diverged = PoolError::RegistryDiverged {
            requested: 3,
            signaled: 2,
        };
        let text = diverged.to_string();
        assert!(text.contains('3') && text.contains('2'), "{text}");
    }
}
