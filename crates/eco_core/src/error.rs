//! # Error Types
//!
//! Errors surfaced by the task executor. The block pool has no recoverable
//! error path: an allocation either succeeds or the process fails fast.

use thiserror::Error;

/// Errors returned by [`TaskExecutor`](crate::TaskExecutor) operations.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// `submit` was called after `stop`. Nothing was queued.
    #[error("executor stopped, task rejected")]
    Stopped,

    /// The executor was configured with zero workers.
    #[error("worker count must be greater than zero")]
    NoWorkers,

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        /// Index of the worker that could not be started.
        index: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single task, delivered only through that task's handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task panicked while running.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text, when it was a string.
        message: String,
    },

    /// The task was dropped without producing a result.
    #[error("task dropped before producing a result")]
    Abandoned,
}

impl TaskError {
    /// Builds a [`TaskError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
