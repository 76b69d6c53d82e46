//! # Block Pool
//!
//! Bump allocation of same-typed slots out of fixed-capacity blocks.
//!
//! ## Allocation Model
//!
//! ```text
//!   blocks:   [ B0: ####### ] [ B1: ###..... ] [ B2: ........ ]
//!                                   ^ cursor (block 1, slot 3)
//!
//!   oversized: [ n > CAP ] [ n > CAP ] ...     (standalone, freed on reset)
//! ```
//!
//! Slots are never recycled individually. [`BlockPool::reset`] rewinds the
//! cursor to the first block and keeps every block for reuse.

#![allow(unsafe_code)]

use std::fmt;
use std::mem::size_of;
use std::ptr::NonNull;

use bytemuck::Zeroable;
use parking_lot::Mutex;

use super::block::Block;

/// Slots per block when no capacity is named.
pub const DEFAULT_BLOCK_CAPACITY: usize = 4096;

/// Memory usage snapshot returned by [`BlockPool::stats`].
///
/// Oversized allocations are charged one full block (`CAP * size_of::<T>()`)
/// each, in both `used_bytes` and `total_bytes`, whatever their real length.
/// This is a known approximation kept for parity with existing consumers of
/// these numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Bytes between the start of the first block and the cursor, plus one
    /// block per oversized allocation.
    pub used_bytes: usize,
    /// Bytes held by all blocks, plus one block per oversized allocation.
    pub total_bytes: usize,
    /// Number of blocks owned by the pool.
    pub blocks: usize,
    /// Number of live oversized allocations.
    pub oversized: usize,
}

impl From<PoolStats> for (usize, usize) {
    fn from(stats: PoolStats) -> Self {
        (stats.used_bytes, stats.total_bytes)
    }
}

/// A thread-safe pool of `T` slots carved from blocks of `CAP` slots.
///
/// Every allocation borrows the pool, and [`reset`](Self::reset) needs
/// `&mut self`, so no slot reference can survive a reset or the pool itself.
///
/// # Type Requirements
///
/// The pool never runs destructors, so `T` must be [`Copy`]. Blocks start
/// zero-filled, so `T` must be [`Zeroable`].
///
/// ```
/// use eco_core::BlockPool;
/// let pool: BlockPool<[f32; 3], 64> = BlockPool::new(1);
/// let v = pool.allocate();
/// *v = [1.0, 2.0, 3.0];
/// ```
/// ```compile_fail
/// // Error: String has a destructor.
/// use eco_core::BlockPool;
/// let pool: BlockPool<String> = BlockPool::new(1);
/// ```
/// ```compile_fail
/// // Error: a slot cannot outlive a reset.
/// use eco_core::BlockPool;
/// let mut pool: BlockPool<u32, 8> = BlockPool::new(1);
/// let slot = pool.allocate();
/// pool.reset();
/// *slot = 1;
/// ```
/// ```compile_fail
/// // Error: zero-sized slots.
/// use eco_core::BlockPool;
/// let pool: BlockPool<(), 8> = BlockPool::new(1);
/// ```
///
/// # Example
///
/// ```rust
/// use eco_core::BlockPool;
///
/// let pool: BlockPool<i32, 4> = BlockPool::new(1);
/// for i in 0..5 {
///     *pool.allocate() = i;
/// }
/// let stats = pool.stats();
/// assert_eq!(stats.blocks, 2);
/// assert_eq!((stats.used_bytes, stats.total_bytes), (20, 32));
/// ```
pub struct BlockPool<T, const CAP: usize = DEFAULT_BLOCK_CAPACITY> {
    state: Mutex<PoolState<T, CAP>>,
}

/// Bookkeeping guarded by the pool lock.
struct PoolState<T, const CAP: usize> {
    blocks: Vec<Block<T>>,
    oversized: Vec<Block<T>>,
    current_block: usize,
    current_slot: usize,
}

impl<T: Zeroable, const CAP: usize> PoolState<T, CAP> {
    /// Reserves `n` contiguous slots (`n <= CAP`) and returns the first.
    fn carve(&mut self, n: usize) -> NonNull<T> {
        debug_assert!(n <= CAP);

        if self.current_slot + n > CAP {
            // The tail of the current block is abandoned until reset.
            self.current_block += 1;
            self.current_slot = 0;
        }

        if self.current_block == self.blocks.len() {
            self.blocks.push(Block::zeroed(CAP));
            tracing::trace!(
                blocks = self.blocks.len(),
                capacity = CAP,
                "block pool grew"
            );
        }

        let slot = self.blocks[self.current_block].slot_ptr(self.current_slot);
        self.current_slot += n;
        slot
    }

    /// Allocates a standalone run of `n` slots.
    fn oversized(&mut self, n: usize) -> NonNull<T> {
        let block = Block::zeroed(n);
        let base = block.slot_ptr(0);
        self.oversized.push(block);
        tracing::trace!(slots = n, live = self.oversized.len(), "oversized allocation");
        base
    }
}

impl<T, const CAP: usize> PoolState<T, CAP> {
    fn stats(&self) -> PoolStats {
        let block_bytes = CAP * size_of::<T>();
        let charged = self.oversized.len() * block_bytes;
        PoolStats {
            used_bytes: (self.current_block * CAP + self.current_slot) * size_of::<T>() + charged,
            total_bytes: self.blocks.len() * block_bytes + charged,
            blocks: self.blocks.len(),
            oversized: self.oversized.len(),
        }
    }
}

impl<T: Copy + Zeroable, const CAP: usize> BlockPool<T, CAP> {
    const VALID_LAYOUT: () = assert!(
        size_of::<T>() != 0 && CAP != 0,
        "BlockPool needs a non-zero-sized T and a non-zero block capacity"
    );

    /// Creates a pool with `initial_blocks` blocks already allocated.
    ///
    /// With `initial_blocks == 0` the first allocation grows the pool.
    #[must_use]
    pub fn new(initial_blocks: usize) -> Self {
        let () = Self::VALID_LAYOUT;

        let blocks = (0..initial_blocks).map(|_| Block::zeroed(CAP)).collect();
        Self {
            state: Mutex::new(PoolState {
                blocks,
                oversized: Vec::new(),
                current_block: 0,
                current_slot: 0,
            }),
        }
    }

    /// Hands out one slot.
    ///
    /// When the active block is full the cursor moves to the next block,
    /// growing the pool by exactly one block if none is left.
    ///
    /// The slot holds zero on first use and whatever was last written to it
    /// after a [`reset`](Self::reset).
    // Each call receives a slot no other call has received since the last
    // reset, so the returned borrows never alias.
    #[allow(clippy::mut_from_ref)]
    pub fn allocate(&self) -> &mut T {
        let slot = self.state.lock().carve(1);
        // SAFETY: the slot was reserved under the lock for this caller only,
        // and the block outlives `&self`.
        unsafe { &mut *slot.as_ptr() }
    }

    /// Hands out `n` contiguous slots.
    ///
    /// - `n > CAP`: a standalone allocation of exactly `n` slots, kept until
    ///   reset. The cursor does not move.
    /// - the current block has fewer than `n` free slots: its remaining space
    ///   is skipped and the run starts at slot 0 of the next block.
    /// - `n == 0`: an empty slice. The cursor does not move.
    #[allow(clippy::mut_from_ref)]
    pub fn allocate_many(&self, n: usize) -> &mut [T] {
        if n == 0 {
            return &mut [];
        }

        let base = {
            let mut state = self.state.lock();
            if n > CAP {
                state.oversized(n)
            } else {
                state.carve(n)
            }
        };
        // SAFETY: `n` slots starting at `base` were reserved under the lock
        // for this caller only, and their storage outlives `&self`.
        unsafe { std::slice::from_raw_parts_mut(base.as_ptr(), n) }
    }

    /// Allocates a run and fills it from `src`.
    #[allow(clippy::mut_from_ref)]
    pub fn allocate_from_slice(&self, src: &[T]) -> &mut [T] {
        let dst = self.allocate_many(src.len());
        dst.copy_from_slice(src);
        dst
    }
}

impl<T, const CAP: usize> BlockPool<T, CAP> {
    /// Slots per block.
    #[inline]
    #[must_use]
    pub const fn block_capacity(&self) -> usize {
        CAP
    }

    /// Number of blocks currently owned.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.state.lock().blocks.len()
    }

    /// Number of live oversized allocations.
    #[must_use]
    pub fn oversized_count(&self) -> usize {
        self.state.lock().oversized.len()
    }

    /// Returns memory usage. See [`PoolStats`] for the accounting rules.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.state.lock().stats()
    }

    /// Rewinds the cursor and frees every oversized allocation.
    ///
    /// Blocks are kept for reuse and are not re-zeroed.
    pub fn reset(&mut self) {
        let state = self.state.get_mut();
        state.current_block = 0;
        state.current_slot = 0;
        state.oversized.clear();
        tracing::trace!(blocks = state.blocks.len(), "block pool reset");
    }
}

impl<T: Copy + Zeroable, const CAP: usize> Default for BlockPool<T, CAP> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T, const CAP: usize> fmt::Debug for BlockPool<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockPool")
            .field("capacity", &CAP)
            .field("stats", &self.stats())
            .finish()
    }
}
