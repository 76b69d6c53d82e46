//! # Eco Core
//!
//! Two low-level primitives shared by the rest of the toolchain:
//!
//! - [`BlockPool`] - amortized allocation of many same-sized values out of
//!   fixed-capacity blocks, usable from many threads at once
//! - [`TaskExecutor`] - a fixed set of worker threads pulling closures from one
//!   FIFO queue, with a typed [`TaskHandle`] per submission
//!
//! The two are independent. A producer may stage buffers in a pool and then
//! submit work to an executor, but neither type knows about the other.
//!
//! ## Example
//!
//! ```rust
//! use eco_core::{BlockPool, TaskExecutor};
//!
//! let pool: BlockPool<u64, 256> = BlockPool::new(1);
//! let samples = pool.allocate_many(16);
//! samples.iter_mut().enumerate().for_each(|(i, s)| *s = i as u64);
//! let input: Vec<u64> = samples.to_vec();
//!
//! let executor = TaskExecutor::new(2)?;
//! let handle = executor.submit(move || input.iter().sum::<u64>())?;
//! assert_eq!(handle.wait(), Ok(120));
//! # Ok::<(), eco_core::ExecutorError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod executor;
pub mod memory;

pub use error::{ExecutorError, ExecutorResult, TaskError};
pub use executor::{ExecutorConfig, TaskExecutor, TaskHandle};
pub use memory::{BlockPool, PoolStats, DEFAULT_BLOCK_CAPACITY};
