//! # Task Executor
//!
//! A fixed set of worker threads fed from one FIFO queue.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;

use super::config::ExecutorConfig;
use super::handle::{self, TaskHandle};
use super::worker::{self, JobQueue};
use crate::error::{ExecutorError, ExecutorResult};

/// Runs submitted closures on a fixed number of worker threads.
///
/// Submission never blocks. Tasks start in submission order as workers become
/// free; they may finish in any order. Each submission returns a
/// [`TaskHandle`] that receives the task's value, or its panic.
///
/// Dropping the executor stops it: queued tasks are still run, then every
/// worker is joined.
///
/// # Example
///
/// ```rust
/// use eco_core::TaskExecutor;
///
/// let executor = TaskExecutor::new(2)?;
/// let handles: Vec<_> = (0..4u32)
///     .map(|i| executor.submit(move || i * i))
///     .collect::<Result<_, _>>()?;
///
/// let squares: Vec<u32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
/// assert_eq!(squares, [0, 1, 4, 9]);
/// # Ok::<(), eco_core::ExecutorError>(())
/// ```
pub struct TaskExecutor {
    queue: Arc<JobQueue>,
    /// Join handles, emptied by the first `stop`.
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Worker thread ids, for recognizing `stop` calls made from a task.
    worker_ids: Vec<ThreadId>,
    thread_count: usize,
}

impl TaskExecutor {
    /// Starts an executor with `worker_count` workers and default settings.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::NoWorkers`] for a zero count,
    /// [`ExecutorError::Spawn`] if a thread cannot be started.
    pub fn new(worker_count: usize) -> ExecutorResult<Self> {
        Self::with_config(&ExecutorConfig::with_workers(worker_count))
    }

    /// Starts one worker per available hardware thread.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::Spawn`] if a thread cannot be started.
    pub fn with_available_parallelism() -> ExecutorResult<Self> {
        Self::with_config(&ExecutorConfig::default())
    }

    /// Starts an executor from an explicit configuration.
    ///
    /// If any worker fails to start, the ones already running are stopped
    /// and joined before the error is returned.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::NoWorkers`] for a zero worker count,
    /// [`ExecutorError::Spawn`] if a thread cannot be started.
    pub fn with_config(config: &ExecutorConfig) -> ExecutorResult<Self> {
        if config.worker_count == 0 {
            return Err(ExecutorError::NoWorkers);
        }

        let queue = Arc::new(JobQueue::new());
        let mut workers = Vec::with_capacity(config.worker_count);

        for index in 0..config.worker_count {
            match worker::spawn(index, Arc::clone(&queue), config) {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    queue.close();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(ExecutorError::Spawn { index, source });
                }
            }
        }

        let worker_ids = workers.iter().map(|h| h.thread().id()).collect();
        tracing::debug!(
            workers = config.worker_count,
            name = %config.thread_name,
            "task executor started"
        );

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            worker_ids,
            thread_count: config.worker_count,
        })
    }

    /// Queues `task` and returns a handle to its result without blocking.
    ///
    /// Arguments are bound by capturing them in the closure.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::Stopped`] once [`stop`](Self::stop) has been called.
    /// The task is not queued in that case.
    pub fn submit<F, R>(&self, task: F) -> ExecutorResult<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (handle, job) = handle::package(task);
        self.queue.push(job).map_err(|_| ExecutorError::Stopped)?;
        Ok(handle)
    }

    /// Number of tasks waiting for a worker.
    ///
    /// Advisory only: it can change as soon as the lock is released.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Number of worker threads, fixed at construction.
    #[inline]
    #[must_use]
    pub const fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.queue.is_closed()
    }

    /// Stops accepting tasks, lets the workers drain the queue, and joins
    /// them.
    ///
    /// Idempotent. Every caller returns only after all workers have exited,
    /// except a call made from inside one of this executor's own tasks: that
    /// call only closes the queue, since a worker cannot join itself.
    pub fn stop(&self) {
        if self.queue.close() {
            tracing::debug!(pending = self.queue.len(), "task executor stopping");
        }

        if self.worker_ids.contains(&thread::current().id()) {
            return;
        }

        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            // Jobs catch their own panics, so a worker only fails to join if
            // the runtime itself is broken.
            let _ = handle.join();
        }
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("thread_count", &self.thread_count)
            .field("queue_size", &self.queue_size())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
