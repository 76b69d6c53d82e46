//! # Task Handles
//!
//! Each submission gets its own one-slot channel. The worker sends exactly
//! one outcome into it; the submitter is the only receiver.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};

use super::worker::Job;
use crate::error::TaskError;

/// Handle to the result of a submitted task.
///
/// Dropping the handle discards the result; the task still runs.
///
/// Once the result has been taken by [`try_wait`](Self::try_wait) or
/// [`wait_timeout`](Self::wait_timeout), later polls report
/// [`TaskError::Abandoned`].
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<R> {
    receiver: Receiver<Result<R, TaskError>>,
}

impl<R> TaskHandle<R> {
    /// Blocks until the task has run and returns its outcome.
    ///
    /// # Errors
    ///
    /// [`TaskError::Panicked`] if the task panicked, [`TaskError::Abandoned`]
    /// if it was dropped without running.
    pub fn wait(self) -> Result<R, TaskError> {
        self.receiver.recv().unwrap_or(Err(TaskError::Abandoned))
    }

    /// Blocks for at most `timeout`. Returns `None` if the task is not done
    /// yet; the handle stays usable.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<R, TaskError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(TaskError::Abandoned)),
        }
    }

    /// Takes the outcome if the task has finished, without blocking.
    pub fn try_wait(&self) -> Option<Result<R, TaskError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TaskError::Abandoned)),
        }
    }

    /// Returns true if an outcome is waiting to be taken.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !self.receiver.is_empty()
    }
}

impl<R> std::fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Wraps `task` into a queueable job paired with the handle for its result.
///
/// A panic inside `task` is caught here and sent as [`TaskError::Panicked`],
/// so the worker running the job never unwinds.
pub(crate) fn package<F, R>(task: F) -> (TaskHandle<R>, Job)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (sender, receiver) = bounded(1);

    let job: Job = Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
            let error = TaskError::from_panic(payload.as_ref());
            tracing::debug!(%error, "task failed");
            error
        });
        // No receiver means the handle was dropped; the outcome goes nowhere.
        let _ = sender.send(outcome);
    });

    (TaskHandle { receiver }, job)
}
