//! # Memory Management
//!
//! Block pools for many short-lived values of one type.
//!
//! ## Design Philosophy
//!
//! Memory is grabbed a block at a time and handed out by bumping a cursor:
//! - No per-value heap calls
//! - No per-value frees, only a pool-wide reset
//! - One short critical section per allocation

mod block;
mod block_pool;

pub use block_pool::{BlockPool, PoolStats, DEFAULT_BLOCK_CAPACITY};
