//! Data model: interaction records and the shared factor grid
//!
//! The factor matrices are mutated in place by every worker with no mutual
//! exclusion. [`FactorGrid`] is the explicit escape hatch that permits those
//! non-atomic concurrent writes: it erases the exclusive borrow into a raw
//! pointer so independent workers can race on rows, which is the Hogwild
//! premise (collisions are rare relative to update volume and the algorithm
//! converges in expectation despite them).

use std::marker::PhantomData;

/// One observed `(user, item, rating)` entry of the sparse interaction matrix.
///
/// Immutable for the lifetime of a launch; stored as a dense sequence of
/// length `nnz`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    /// Row index into the user factor matrix P
    pub user: u32,
    /// Row index into the item factor matrix Q
    pub item: u32,
    /// Observed rating value
    pub rating: f32,
}

impl Interaction {
    /// Create an interaction record
    pub fn new(user: u32, item: u32, rating: f32) -> Self {
        Self { user, item, rating }
    }
}

/// Shared mutable view of a factor matrix, concurrently writable by every
/// worker without synchronization.
///
/// Reads and writes are plain (non-atomic); two workers touching the same
/// row may race and one update may be lost. That is the accepted Hogwild
/// trade-off, not a bug. Only the statistics buffers use atomics.
pub(crate) struct FactorGrid<'a> {
    ptr: *mut f32,
    len: usize,
    _marker: PhantomData<&'a mut [f32]>,
}

// Workers on other threads read and write through the raw pointer. Data
// races on f32 cells are tolerated by the algorithm; the pointer itself is
// never mutated after construction.
unsafe impl Sync for FactorGrid<'_> {}
unsafe impl Send for FactorGrid<'_> {}

impl<'a> FactorGrid<'a> {
    /// Wrap a factor array for shared concurrent access.
    ///
    /// The exclusive borrow is held for `'a`, so no other safe access to the
    /// buffer can overlap the launch.
    pub(crate) fn new(buf: &'a mut [f32]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            _marker: PhantomData,
        }
    }

    /// Copy one row tile `[base, base + tile.len())` into a worker-local
    /// buffer.
    ///
    /// # Safety
    /// `base + tile.len() <= self.len()`. The read may race with concurrent
    /// writers; any torn mixture of old and new f32 values is acceptable.
    #[inline]
    pub(crate) unsafe fn read_tile(&self, base: usize, tile: &mut [f32]) {
        debug_assert!(base + tile.len() <= self.len);
        std::ptr::copy_nonoverlapping(self.ptr.add(base), tile.as_mut_ptr(), tile.len());
    }

    /// Plain unsynchronized write of one element.
    ///
    /// # Safety
    /// `index < self.len()`. May race with concurrent readers and writers.
    #[inline]
    pub(crate) unsafe fn write(&self, index: usize, value: f32) {
        debug_assert!(index < self.len);
        *self.ptr.add(index) = value;
    }
}
