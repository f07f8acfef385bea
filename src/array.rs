use std::borrow::{Borrow, BorrowMut};
use std::cmp;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::slice;

use log::{debug, trace};

use crate::error::{ArrayError, Result};
use crate::raw::{self, Filling, RawBlock};

/// A contiguous growable array over a manually managed block of memory.
///
/// Slots `[0, len)` of the block hold live values; the rest of the block is
/// uninitialized. Growth always allocates a fresh block and moves the live
/// values over, then frees the old one. Pushing doubles the capacity when the
/// block is full; popping below a quarter of the capacity shrinks the block to
/// fit.
///
/// Every size-accepting operation comes in two forms: `try_*` returns an
/// [`ArrayError`] and leaves the array untouched, the plain form panics (or
/// calls [`handle_alloc_error`](std::alloc::handle_alloc_error) on allocator
/// failure).
///
/// ```
/// use dynarray::DynamicArray;
///
/// let mut arr = DynamicArray::new();
/// for i in 1..=5 {
///     arr.push(i);
/// }
/// assert_eq!(arr, [1, 2, 3, 4, 5]);
/// assert_eq!(arr.capacity(), 8);
/// ```
pub struct DynamicArray<T> {
    block: RawBlock<T>,
    len: usize,
}

// SAFETY: the array owns its values outright, like `Box<[T]>`.
unsafe impl<T: Send> Send for DynamicArray<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for DynamicArray<T> {}

impl<T> DynamicArray<T> {
    /// Creates an empty array. Does not allocate.
    pub const fn new() -> Self {
        Self {
            block: RawBlock::empty(),
            len: 0,
        }
    }

    /// Creates an empty array with exactly `capacity` slots.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            block: RawBlock::try_allocate(capacity)?,
            len: 0,
        })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        raw::unwrap_alloc(Self::try_with_capacity(capacity))
    }

    /// Creates an array of `count` default values in a block of exactly
    /// `count` slots.
    pub fn try_with_len(count: usize) -> Result<Self>
    where
        T: Default,
    {
        Self::try_from_fn(count, T::default)
    }

    pub fn with_len(count: usize) -> Self
    where
        T: Default,
    {
        raw::unwrap_alloc(Self::try_with_len(count))
    }

    /// Creates an array of `count` copies of `value` in a block of exactly
    /// `count` slots.
    pub fn try_from_elem(count: usize, value: T) -> Result<Self>
    where
        T: Clone,
    {
        let mut fill = Filling::new(RawBlock::try_allocate(count)?, 0);
        if count > 0 {
            for _ in 1..count {
                fill.push(value.clone());
            }
            fill.push(value);
        }
        Ok(Self::from_filling(fill))
    }

    pub fn from_elem(count: usize, value: T) -> Self
    where
        T: Clone,
    {
        raw::unwrap_alloc(Self::try_from_elem(count, value))
    }

    /// Creates an array from a re-traversable range.
    ///
    /// The range is walked once to count it, a block of exactly that many
    /// slots is allocated, and the values are then taken in order.
    ///
    /// ```
    /// use dynarray::DynamicArray;
    ///
    /// let arr = DynamicArray::try_from_range(10..14).unwrap();
    /// assert_eq!(arr, [10, 11, 12, 13]);
    /// assert_eq!(arr.capacity(), 4);
    /// ```
    pub fn try_from_range<I>(range: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Clone,
    {
        let iter = range.into_iter();
        let count = iter.clone().count();
        let mut fill = Filling::new(RawBlock::try_allocate(count)?, 0);
        for value in iter.take(count) {
            fill.push(value);
        }
        Ok(Self::from_filling(fill))
    }

    pub fn from_range<I>(range: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Clone,
    {
        raw::unwrap_alloc(Self::try_from_range(range))
    }

    fn try_from_fn(count: usize, mut f: impl FnMut() -> T) -> Result<Self> {
        let mut fill = Filling::new(RawBlock::try_allocate(count)?, 0);
        for _ in 0..count {
            fill.push(f());
        }
        Ok(Self::from_filling(fill))
    }

    fn from_filling(fill: Filling<T>) -> Self {
        let (block, len) = fill.finish();
        Self { block, len }
    }

    /// Moves the contents out, leaving `self` empty with no allocation.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Replaces the contents with those of `other` without copying.
    /// `other` is left empty with no allocation.
    pub fn take_from(&mut self, other: &mut Self) {
        *self = other.take();
    }

    /// Replaces the contents with a deep copy of `other`.
    ///
    /// The copy is built in a new block with `other`'s capacity before the
    /// current values are dropped; on failure `self` is unchanged.
    pub fn try_assign_from(&mut self, other: &Self) -> Result<()>
    where
        T: Clone,
    {
        *self = other.try_clone()?;
        Ok(())
    }

    /// Replaces the contents with `count` copies of `value`.
    pub fn try_assign(&mut self, count: usize, value: T) -> Result<()>
    where
        T: Clone,
    {
        *self = Self::try_from_elem(count, value)?;
        Ok(())
    }

    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        raw::unwrap_alloc(self.try_assign(count, value))
    }

    /// Replaces the contents with the values of `range`. See
    /// [`try_from_range`](Self::try_from_range).
    pub fn try_assign_range<I>(&mut self, range: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Clone,
    {
        *self = Self::try_from_range(range)?;
        Ok(())
    }

    pub fn assign_range<I>(&mut self, range: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Clone,
    {
        raw::unwrap_alloc(self.try_assign_range(range))
    }

    /// Replaces the contents with the values of `values`, in order.
    pub fn assign_array<const N: usize>(&mut self, values: [T; N]) {
        *self = Self::from(values);
    }

    fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        let mut fill = Filling::new(RawBlock::try_allocate(self.capacity())?, 0);
        for value in self.iter() {
            fill.push(value.clone());
        }
        Ok(Self::from_filling(fill))
    }

    /// Checked access.
    ///
    /// ```
    /// use dynarray::{ArrayError, DynamicArray};
    ///
    /// let arr = DynamicArray::from_elem(3, "x");
    /// assert_eq!(arr.at(2), Ok(&"x"));
    /// assert_eq!(arr.at(5), Err(ArrayError::OutOfRange { index: 5, len: 3 }));
    /// ```
    pub fn at(&self, pos: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice().get(pos).ok_or_else(|| out_of_range(pos, len))
    }

    pub fn at_mut(&mut self, pos: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(pos)
            .ok_or_else(|| out_of_range(pos, len))
    }

    /// Unchecked access.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len). No bounds check is made.
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        // SAFETY: the caller guarantees the slot is live.
        unsafe { &*self.block.as_ptr().add(index) }
    }

    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len).
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        // SAFETY: the caller guarantees the slot is live.
        unsafe { &mut *self.block.as_ptr().add(index) }
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// # Safety
    ///
    /// The array must not be empty.
    pub unsafe fn front_unchecked(&self) -> &T {
        // SAFETY: forwarded to the caller.
        unsafe { self.get_unchecked(0) }
    }

    /// # Safety
    ///
    /// The array must not be empty.
    pub unsafe fn back_unchecked(&self) -> &T {
        // SAFETY: forwarded to the caller.
        unsafe { self.get_unchecked(self.len.wrapping_sub(1)) }
    }

    /// Pointer to the first live value, or null when the array is empty.
    pub fn data(&self) -> *const T {
        if self.len == 0 {
            ptr::null()
        } else {
            self.block.as_ptr()
        }
    }

    /// Mutable counterpart of [`data`](Self::data).
    pub fn data_mut(&mut self) -> *mut T {
        if self.len == 0 {
            ptr::null_mut()
        } else {
            self.block.as_ptr()
        }
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) is live; an empty block yields a dangling, aligned pointer.
        unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.block.as_ptr(), self.len) }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Largest capacity an array of `T` can have.
    pub fn max_size(&self) -> usize {
        raw::max_size::<T>()
    }

    /// Grows the block to exactly `new_cap` slots.
    ///
    /// Does nothing when `new_cap` is not above the current capacity; this
    /// never shrinks.
    pub fn try_reserve(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.capacity() {
            return Ok(());
        }
        self.relocate(new_cap)
    }

    pub fn reserve(&mut self, new_cap: usize) {
        raw::unwrap_alloc(self.try_reserve(new_cap))
    }

    /// Reallocates the block to exactly [`len`](Self::len) slots, releasing it
    /// entirely when the array is empty.
    ///
    /// If the smaller block cannot be allocated, returns
    /// [`ArrayError::AllocFailed`] and the array keeps its current block.
    pub fn try_shrink_to_fit(&mut self) -> Result<()> {
        if self.capacity() == self.len {
            return Ok(());
        }
        self.relocate(self.len)
    }

    pub fn shrink_to_fit(&mut self) {
        raw::unwrap_alloc(self.try_shrink_to_fit())
    }

    /// Drops every value in index order and releases the block.
    pub fn clear(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        let block = mem::replace(&mut self.block, RawBlock::empty());
        // SAFETY: the first `len` slots were live and are no longer reachable
        // through `self`. `block` is freed on scope exit even if a destructor
        // panics.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(block.as_ptr(), len)) };
    }

    /// Appends `value`, doubling the capacity first when the block is full.
    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.ensure_spare()?;
        // SAFETY: ensure_spare left at least one free slot.
        unsafe { self.write_next(value) };
        Ok(())
    }

    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            raw::unwrap_alloc(self.grow());
        }
        // SAFETY: there is at least one free slot.
        unsafe { self.write_next(value) };
    }

    /// Appends a clone of `value`.
    pub fn push_cloned(&mut self, value: &T)
    where
        T: Clone,
    {
        self.push(value.clone());
    }

    /// Builds a value from `args` and appends it, returning a reference to it.
    ///
    /// ```
    /// use dynarray::DynamicArray;
    ///
    /// let mut names: DynamicArray<String> = DynamicArray::new();
    /// names.emplace("left").push_str("-most");
    /// assert_eq!(names[0], "left-most");
    /// ```
    pub fn emplace<A>(&mut self, args: A) -> &mut T
    where
        T: From<A>,
    {
        self.emplace_with(|| T::from(args))
    }

    /// Appends the value produced by `f`. The value is produced before any
    /// relocation, so a panicking `f` leaves the array untouched.
    pub fn emplace_with<F>(&mut self, f: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let value = f();
        raw::unwrap_alloc(self.ensure_spare());
        // SAFETY: ensure_spare left at least one free slot.
        unsafe { self.write_next(value) }
    }

    /// Removes and returns the last value.
    ///
    /// When fewer than a quarter of the slots remain in use the block is
    /// shrunk to fit.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was live and is now outside [0, len).
        let value = unsafe { ptr::read(self.block.as_ptr().add(self.len)) };
        self.shrink_if_sparse();
        Some(value)
    }

    /// Drops the last value in place. Same shrink policy as [`pop`](Self::pop).
    pub fn pop_discard(&mut self) {
        if self.len == 0 {
            return;
        }
        self.len -= 1;
        // SAFETY: the slot was live and is now outside [0, len).
        unsafe { ptr::drop_in_place(self.block.as_ptr().add(self.len)) };
        self.shrink_if_sparse();
    }

    /// Resizes to `count` values, filling new slots with values from `f`.
    ///
    /// Shrinking drops the tail `[count, len)` and keeps the block. Growing
    /// past the capacity builds a block of exactly `count` slots; growing
    /// within it writes into the spare slots. If `f` panics, the values it
    /// already produced are dropped and the array is left as it was.
    pub fn try_resize_with<F>(&mut self, count: usize, mut f: F) -> Result<()>
    where
        F: FnMut() -> T,
    {
        if count <= self.len {
            self.truncate_to(count);
            return Ok(());
        }

        if count > self.capacity() {
            let mut fill = Filling::new(RawBlock::try_allocate(count)?, self.len);
            while fill.end() < count {
                fill.push(f());
            }
            let (fresh, _) = fill.finish();
            trace!("resize: {} -> {} slots", self.capacity(), count);
            // SAFETY: [0, len) is live here and free in `fresh`.
            unsafe { self.block.move_prefix_to(&fresh, self.len) };
            self.block = fresh;
            self.len = count;
        } else {
            let mut tail = GrowInPlace::new(self);
            while tail.array.len < count {
                tail.push(f());
            }
            tail.commit();
        }
        Ok(())
    }

    pub fn resize_with<F>(&mut self, count: usize, f: F)
    where
        F: FnMut() -> T,
    {
        raw::unwrap_alloc(self.try_resize_with(count, f))
    }

    /// Resizes to `count` values, filling new slots with clones of `value`.
    pub fn try_resize(&mut self, count: usize, value: T) -> Result<()>
    where
        T: Clone,
    {
        self.try_resize_with(count, || value.clone())
    }

    pub fn resize(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        raw::unwrap_alloc(self.try_resize(count, value))
    }

    /// Resizes to `count` values, filling new slots with `T::default()`.
    pub fn try_resize_default(&mut self, count: usize) -> Result<()>
    where
        T: Default,
    {
        self.try_resize_with(count, T::default)
    }

    pub fn resize_default(&mut self, count: usize)
    where
        T: Default,
    {
        raw::unwrap_alloc(self.try_resize_default(count))
    }

    /// Exchanges blocks and lengths with `other`. No value is touched.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub(crate) fn into_raw_parts(self) -> (RawBlock<T>, usize) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the block is moved out exactly once.
        let block = unsafe { ptr::read(&this.block) };
        (block, this.len)
    }

    fn ensure_spare(&mut self) -> Result<()> {
        if self.len == self.capacity() {
            self.grow()
        } else {
            Ok(())
        }
    }

    fn grow(&mut self) -> Result<()> {
        let max = raw::max_size::<T>();
        if self.len == max {
            debug!("push rejected: array already holds {max} values");
            return Err(ArrayError::CapacityOverflow {
                requested: self.len.saturating_add(1),
                max,
            });
        }
        let new_cap = cmp::max(1, self.capacity().saturating_mul(2)).min(max);
        self.relocate(new_cap)
    }

    /// Moves the live values into a fresh block of exactly `new_cap` slots
    /// and frees the old one.
    fn relocate(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);
        let fresh = RawBlock::try_allocate(new_cap)?;
        trace!(
            "relocate: {} -> {} slots ({} live)",
            self.capacity(),
            new_cap,
            self.len
        );
        // SAFETY: [0, len) is live and `fresh` holds at least len slots.
        unsafe { self.block.move_prefix_to(&fresh, self.len) };
        self.block = fresh;
        Ok(())
    }

    /// Shrink policy applied after a pop. Best-effort: a pop has already
    /// succeeded, so a refused smaller block leaves the larger one in place.
    fn shrink_if_sparse(&mut self) {
        if self.len < self.capacity() / 4 {
            if let Err(err) = self.try_shrink_to_fit() {
                debug!("shrink to {} slots skipped: {err}", self.len);
            }
        }
    }

    fn truncate_to(&mut self, count: usize) {
        let old_len = self.len;
        if count >= old_len {
            return;
        }
        self.len = count;
        // SAFETY: [count, old_len) was live and is now outside [0, len).
        unsafe {
            let tail = self.block.as_ptr().add(count);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(tail, old_len - count));
        }
    }

    /// # Safety
    ///
    /// `len < capacity`.
    unsafe fn write_next(&mut self, value: T) -> &mut T {
        debug_assert!(self.len < self.capacity());
        // SAFETY: the slot is in bounds and uninitialized.
        unsafe {
            let slot = self.block.as_ptr().add(self.len);
            ptr::write(slot, value);
            self.len += 1;
            &mut *slot
        }
    }
}

fn out_of_range(index: usize, len: usize) -> ArrayError {
    debug!("at({index}) rejected: len {len}");
    ArrayError::OutOfRange { index, len }
}

/// Appends into spare capacity; values appended through the guard are dropped
/// again unless [`commit`](GrowInPlace::commit) is reached.
struct GrowInPlace<'a, T> {
    array: &'a mut DynamicArray<T>,
    base_len: usize,
}

impl<'a, T> GrowInPlace<'a, T> {
    fn new(array: &'a mut DynamicArray<T>) -> Self {
        let base_len = array.len;
        Self { array, base_len }
    }

    fn push(&mut self, value: T) {
        assert!(self.array.len < self.array.capacity());
        // SAFETY: checked above.
        unsafe { self.array.write_next(value) };
    }

    fn commit(mut self) {
        self.base_len = self.array.len;
    }
}

impl<T> Drop for GrowInPlace<'_, T> {
    fn drop(&mut self) {
        self.array.truncate_to(self.base_len);
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // SAFETY: [0, len) is live. The block frees itself afterwards.
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DynamicArray<T> {
    fn clone(&self) -> Self {
        raw::unwrap_alloc(self.try_clone())
    }

    fn clone_from(&mut self, source: &Self) {
        raw::unwrap_alloc(self.try_assign_from(source))
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for DynamicArray<T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for DynamicArray<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T> Borrow<[T]> for DynamicArray<T> {
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T> BorrowMut<[T]> for DynamicArray<T> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Hash> Hash for DynamicArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: PartialEq<U>, U> PartialEq<DynamicArray<U>> for DynamicArray<T> {
    fn eq(&self, other: &DynamicArray<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: PartialEq<U>, U> PartialEq<[U]> for DynamicArray<T> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U> PartialEq<&[U]> for DynamicArray<T> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for DynamicArray<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {
    fn from(values: [T; N]) -> Self {
        let mut fill = Filling::new(raw::unwrap_alloc(RawBlock::try_allocate(N)), 0);
        for value in values {
            fill.push(value);
        }
        Self::from_filling(fill)
    }
}

impl<T: Clone> From<&[T]> for DynamicArray<T> {
    fn from(values: &[T]) -> Self {
        Self::from_range(values.iter().cloned())
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let needed = self.len.saturating_add(lower).min(raw::max_size::<T>());
        if needed > self.capacity() {
            // Keep the doubling sequence; an unallocated array is sized exactly.
            let doubled = self.capacity().saturating_mul(2).min(raw::max_size::<T>());
            self.reserve(cmp::max(needed, doubled));
        }
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
