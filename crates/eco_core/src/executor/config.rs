//! # Executor Configuration

use std::num::NonZeroUsize;
use std::thread;

/// Configuration for a [`TaskExecutor`](crate::TaskExecutor).
///
/// With the `serde` feature enabled the config can be read from a file; any
/// missing field falls back to its [`Default`] value.
///
/// ```toml
/// worker_count = 4
/// thread_name = "mesh-export"
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExecutorConfig {
    /// Number of worker threads. Fixed for the executor's lifetime.
    pub worker_count: usize,
    /// Worker thread name prefix. Workers are named `{thread_name}-{index}`.
    pub thread_name: String,
    /// Stack size in bytes per worker, or `None` for the platform default.
    pub stack_size: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: Self::available_parallelism(),
            thread_name: "eco-worker".to_string(),
            stack_size: None,
        }
    }
}

impl ExecutorConfig {
    /// Hardware parallelism as reported by the OS, or 1 if unknown.
    #[must_use]
    pub fn available_parallelism() -> usize {
        thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }

    /// Default config with an explicit worker count.
    #[must_use]
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// One worker: tasks start strictly in submission order.
    #[must_use]
    pub fn serial() -> Self {
        Self::with_workers(1)
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the per-worker stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}
