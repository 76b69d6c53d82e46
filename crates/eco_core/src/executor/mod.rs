//! # Parallel Task Execution
//!
//! A fixed pool of worker threads behind one mutex-guarded FIFO queue.
//!
//! ## Guarantees
//!
//! - `submit` never blocks on a running task, only on the short queue lock
//! - tasks run with the queue lock released, so independent tasks overlap
//! - a task that was accepted always runs, even if `stop` follows at once
//! - a panicking task fails only its own [`TaskHandle`]

mod config;
mod handle;
mod task_executor;
mod worker;

pub use config::ExecutorConfig;
pub use handle::TaskHandle;
pub use task_executor::TaskExecutor;
