//! # Block Storage
//!
//! An owned, zero-filled, fixed-length run of slots whose address never
//! changes for as long as the block lives.
//!
//! ## Safety Note
//!
//! Blocks hand out raw slot pointers so the pool can give disjoint `&mut`
//! borrows to several threads at once. Storage is held as a leaked box
//! rather than a `Box<[T]>` so that those pointers are never invalidated by
//! a unique borrow of the owner.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use bytemuck::Zeroable;

/// A heap allocation of `len` zero-initialized `T`s.
pub(crate) struct Block<T> {
    slots: NonNull<[T]>,
}

impl<T: Zeroable> Block<T> {
    /// Allocates `len` zeroed slots.
    ///
    /// Aborts through the global allocator if the memory cannot be obtained.
    pub(crate) fn zeroed(len: usize) -> Self {
        let boxed: Box<[T]> = bytemuck::allocation::zeroed_slice_box(len);
        Self {
            slots: NonNull::from(Box::leak(boxed)),
        }
    }
}

impl<T> Block<T> {
    /// Number of slots in the block.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Pointer to slot `offset`.
    ///
    /// `offset` may equal `len()` (one past the end), which yields a pointer
    /// usable only as the base of an empty slice.
    #[inline]
    pub(crate) fn slot_ptr(&self, offset: usize) -> NonNull<T> {
        debug_assert!(offset <= self.len());
        // SAFETY: offset is within the allocation or one past its end.
        unsafe { NonNull::new_unchecked(self.slots.as_ptr().cast::<T>().add(offset)) }
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        // SAFETY: `slots` came from `Box::leak` in `zeroed` and is released once.
        drop(unsafe { Box::from_raw(self.slots.as_ptr()) });
    }
}

// SAFETY: a Block owns its slots like a Box<[T]> does.
unsafe impl<T: Send> Send for Block<T> {}
// SAFETY: a shared Block only exposes raw pointers; access is coordinated by the pool.
unsafe impl<T: Sync> Sync for Block<T> {}
