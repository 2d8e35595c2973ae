//! Worker pool error types.

use std::fmt;
use std::time::Duration;

/// Errors that can occur during pool operations.
///
/// Backpressure is not an error: a plain [`acquire`](super::Pool::acquire)
/// simply blocks until a worker parks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was asked to start with zero workers.
    InvalidCapacity,

    /// A group size of zero, or one larger than the pool could ever lease.
    InvalidGroupSize {
        /// Requested group size.
        size: usize,
        /// Pool capacity.
        capacity: usize,
    },

    /// No worker offered itself before the acquire deadline.
    Timeout(Duration),

    /// Every worker thread has exited, nothing can be acquired any more.
    Closed,

    /// The worker thread behind a lease is gone (a task panicked on it).
    WorkerGone {
        /// Id of the dead worker.
        worker: usize,
    },

    /// The OS refused to spawn a worker thread.
    Spawn(String),
}

impl PoolError {
    /// Check if this is an acquire timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PoolError::Timeout(_))
    }

    /// Check if the pool can no longer hand out workers.
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::Closed)
    }

    /// Check if the leased worker died under the caller.
    pub fn is_worker_gone(&self) -> bool {
        matches!(self, PoolError::WorkerGone { .. })
    }

    /// Get the error message for logging.
    pub fn message(&self) -> &str {
        match self {
            PoolError::InvalidCapacity => "Invalid capacity",
            PoolError::InvalidGroupSize { .. } => "Invalid group size",
            PoolError::Timeout(_) => "Acquire timeout",
            PoolError::Closed => "Pool closed",
            PoolError::WorkerGone { .. } => "Worker gone",
            PoolError::Spawn(msg) => msg,
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::InvalidCapacity => {
                write!(f, "pool capacity must be at least 1")
            }
            PoolError::InvalidGroupSize { size, capacity } => {
                write!(
                    f,
                    "group size {} is outside 1..={} (pool capacity)",
                    size, capacity
                )
            }
            PoolError::Timeout(duration) => {
                write!(f, "no worker available after {}ms", duration.as_millis())
            }
            PoolError::Closed => {
                write!(f, "pool has no live workers left")
            }
            PoolError::WorkerGone { worker } => {
                write!(f, "worker {} is no longer running", worker)
            }
            PoolError::Spawn(msg) => {
                write!(f, "failed to spawn worker thread: {}", msg)
            }
        }
    }
}

impl std::error::Error for PoolError {}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::Spawn(err.to_string())
    }
}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
