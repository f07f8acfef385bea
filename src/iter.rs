//! Owning iterator.

use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use crate::array::DynamicArray;
use crate::raw::RawBlock;

/// Iterator that moves values out of a [`DynamicArray`] in index order.
///
/// Values not yet yielded are dropped, and the block freed, when the
/// iterator is dropped.
pub struct IntoIter<T> {
    block: RawBlock<T>,
    head: usize,
    tail: usize,
}

// SAFETY: same ownership model as `DynamicArray`.
unsafe impl<T: Send> Send for IntoIter<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for IntoIter<T> {}

impl<T> IntoIter<T> {
    /// The values not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [head, tail) is live.
        unsafe { slice::from_raw_parts(self.block.as_ptr().add(self.head), self.tail - self.head) }
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        // The array's destructor must not run; ownership of [0, len) moves
        // to the iterator.
        let (block, len) = self.into_raw_parts();
        IntoIter {
            block,
            head: 0,
            tail: len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        // SAFETY: head < tail, so the slot is live; advancing head gives up
        // ownership of it.
        let value = unsafe { ptr::read(self.block.as_ptr().add(self.head)) };
        self.head += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.tail - self.head;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        // SAFETY: the slot was live and is now outside [head, tail).
        Some(unsafe { ptr::read(self.block.as_ptr().add(self.tail)) })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        // SAFETY: [head, tail) is still live; the block frees itself afterwards.
        unsafe {
            let rest = self.block.as_ptr().add(self.head);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(rest, self.tail - self.head));
        }
    }
}
