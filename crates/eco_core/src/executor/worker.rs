//! # Worker Threads
//!
//! ```text
//!   Producer 1 ──┐
//!   Producer 2 ──┼──> [ Mutex<VecDeque<Job>> + stop flag ] ──> Worker 0..N
//!   Producer N ──┘          (Condvar: job or stop)             (run outside lock)
//! ```
//!
//! Per worker: `Idle -> Running -> Idle`, ending in `Stopped` only once the
//! stop flag is set and the queue is empty.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use super::config::ExecutorConfig;

/// A type-erased unit of work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// State guarded by the queue lock.
struct QueueState {
    /// Pending jobs in submission order.
    jobs: VecDeque<Job>,
    /// Set once by `close`; never cleared.
    stopping: bool,
}

/// The queue shared by an executor and its workers.
pub(crate) struct JobQueue {
    state: Mutex<QueueState>,
    /// Signalled when a job is pushed or the queue is closed.
    available: Condvar,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                stopping: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends a job and wakes one idle worker.
    ///
    /// Hands the job back if the queue is closed.
    pub(crate) fn push(&self, job: Job) -> Result<(), Job> {
        let mut state = self.state.lock();
        if state.stopping {
            return Err(job);
        }
        state.jobs.push_back(job);
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until a job is available and returns it, or returns `None`
    /// once the queue is closed and drained.
    fn next_job(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.stopping {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Rejects further pushes and wakes every worker.
    ///
    /// Returns true for the call that actually closed the queue.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.stopping;
        state.stopping = true;
        self.available.notify_all();
        first
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().stopping
    }
}

/// Starts worker `index` on its own named thread.
pub(crate) fn spawn(
    index: usize,
    queue: Arc<JobQueue>,
    config: &ExecutorConfig,
) -> io::Result<JoinHandle<()>> {
    let mut builder = thread::Builder::new().name(format!("{}-{index}", config.thread_name));
    if let Some(bytes) = config.stack_size {
        builder = builder.stack_size(bytes);
    }
    builder.spawn(move || run(index, &queue))
}

/// Worker main loop. Jobs run with the queue lock released.
fn run(index: usize, queue: &JobQueue) {
    let mut completed = 0u64;
    while let Some(job) = queue.next_job() {
        job();
        completed += 1;
    }
    tracing::trace!(worker = index, completed, "worker stopped");
}
