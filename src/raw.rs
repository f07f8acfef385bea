//! Raw storage: a block of uninitialized slots and the guard used to
//! populate a replacement block before it is committed.
//!
//! `RawBlock` knows nothing about which slots are live. It allocates on
//! creation and frees on drop, and never runs an element destructor.

use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ptr::{self, NonNull};

use log::debug;

use crate::error::{ArrayError, Result};

/// Largest slot count a block of `T` may have.
///
/// Bounded by `isize::MAX` bytes, the limit every Rust allocation is held to.
/// Zero-sized types never allocate, so their ceiling is `usize::MAX`.
pub const fn max_size<T>() -> usize {
    let size = mem::size_of::<T>();
    if size == 0 {
        usize::MAX
    } else {
        isize::MAX as usize / size
    }
}

/// Converts the error of an allocating operation into the failure mode of its
/// infallible counterpart: a panic for oversized requests and
/// `handle_alloc_error` for allocator failures.
pub(crate) fn unwrap_alloc<R>(result: Result<R>) -> R {
    match result {
        Ok(value) => value,
        Err(ArrayError::AllocFailed { bytes, align }) => match Layout::from_size_align(bytes, align) {
            Ok(layout) => handle_alloc_error(layout),
            Err(_) => panic!("allocation of {bytes} bytes failed"),
        },
        Err(err) => panic!("{err}"),
    }
}

/// An exclusively owned block of `capacity` uninitialized slots.
pub(crate) struct RawBlock<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

impl<T> RawBlock<T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// A block with no slots and no allocation.
    pub(crate) const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates exactly `capacity` slots.
    ///
    /// The request is validated against [`max_size`] before the allocator is
    /// touched. A zero capacity, or any capacity for a zero-sized `T`, does
    /// not allocate.
    pub(crate) fn try_allocate(capacity: usize) -> Result<Self> {
        let max = max_size::<T>();
        if capacity > max {
            debug!("rejected block of {capacity} slots: max is {max}");
            return Err(ArrayError::CapacityOverflow {
                requested: capacity,
                max,
            });
        }
        if capacity == 0 {
            return Ok(Self::empty());
        }
        if Self::IS_ZST {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap: capacity,
                _marker: PhantomData,
            });
        }

        let layout = Layout::array::<T>(capacity).map_err(|_| ArrayError::CapacityOverflow {
            requested: capacity,
            max,
        })?;
        // SAFETY: capacity > 0 and T is not zero-sized, so the layout is non-empty.
        let raw = unsafe { alloc(layout) };
        match NonNull::new(raw.cast::<T>()) {
            Some(ptr) => Ok(Self {
                ptr,
                cap: capacity,
                _marker: PhantomData,
            }),
            None => {
                debug!("allocator refused {} bytes", layout.size());
                Err(ArrayError::AllocFailed {
                    bytes: layout.size(),
                    align: layout.align(),
                })
            }
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Bitwise-moves the first `len` slots of `self` into the front of `dst`.
    ///
    /// # Safety
    ///
    /// The first `len` slots of `self` must be initialized and `dst` must hold
    /// at least `len` slots. Afterwards those slots of `self` must be treated
    /// as uninitialized.
    pub(crate) unsafe fn move_prefix_to(&self, dst: &RawBlock<T>, len: usize) {
        debug_assert!(len <= self.cap && len <= dst.cap);
        // SAFETY: distinct blocks never overlap; bounds are the caller's contract.
        unsafe { ptr::copy_nonoverlapping(self.as_ptr(), dst.as_ptr(), len) };
    }

    fn layout(&self) -> Option<Layout> {
        if self.cap == 0 || Self::IS_ZST {
            None
        } else {
            Layout::array::<T>(self.cap).ok()
        }
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        if let Some(layout) = self.layout() {
            // SAFETY: the pointer came from `alloc` with this exact layout.
            unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}

/// Populates slots `[start, ..)` of a fresh block one value at a time.
///
/// If dropped before [`finish`](Filling::finish), every value written so far
/// is dropped and the block is freed, so a panic while producing values
/// leaves nothing behind.
pub(crate) struct Filling<T> {
    block: RawBlock<T>,
    start: usize,
    filled: usize,
}

impl<T> Filling<T> {
    pub(crate) fn new(block: RawBlock<T>, start: usize) -> Self {
        debug_assert!(start <= block.capacity());
        Self {
            block,
            start,
            filled: 0,
        }
    }

    /// One past the last slot written.
    pub(crate) fn end(&self) -> usize {
        self.start + self.filled
    }

    pub(crate) fn push(&mut self, value: T) {
        let slot = self.end();
        assert!(slot < self.block.capacity(), "filling past block capacity");
        // SAFETY: slot is in bounds and has not been written yet.
        unsafe { ptr::write(self.block.as_ptr().add(slot), value) };
        self.filled += 1;
    }

    /// Stops guarding and hands back the block together with [`end`](Filling::end).
    /// Slots `[start, end)` are now owned by the caller.
    pub(crate) fn finish(self) -> (RawBlock<T>, usize) {
        let this = ManuallyDrop::new(self);
        let end = this.end();
        // SAFETY: `this` is never dropped, so the block is moved out exactly once.
        let block = unsafe { ptr::read(&this.block) };
        (block, end)
    }
}

impl<T> Drop for Filling<T> {
    fn drop(&mut self) {
        // SAFETY: exactly the slots [start, start + filled) were written.
        unsafe {
            let first = self.block.as_ptr().add(self.start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, self.filled));
        }
    }
}
