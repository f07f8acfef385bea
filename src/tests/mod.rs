use super::*;
use crossbeam::scope;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts live instances through a shared counter.
#[derive(Debug)]
struct Tracked {
    id: usize,
    live: Arc<AtomicUsize>,
}

impl Tracked {
    fn new(id: usize, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            id,
            live: Arc::clone(live),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.id, &self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Clone panics once `budget` clones have been made.
#[derive(Debug)]
struct Fragile {
    live: Arc<AtomicUsize>,
    budget: Arc<AtomicUsize>,
}

impl Fragile {
    fn new(live: &Arc<AtomicUsize>, budget: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            live: Arc::clone(live),
            budget: Arc::clone(budget),
        }
    }
}

impl Clone for Fragile {
    fn clone(&self) -> Self {
        if self.budget.fetch_sub(1, Ordering::SeqCst) == 0 {
            panic!("clone budget exhausted");
        }
        Self::new(&self.live, &self.budget)
    }
}

impl Drop for Fragile {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn live() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

#[test]
fn test_push_pop_is_lifo() {
    let mut v = DynamicArray::new();
    for word in ["alpha", "beta", "gamma"] {
        v.push(String::from(word));
    }
    assert_eq!(v, ["alpha", "beta", "gamma"].map(String::from));
    let drained: Vec<String> = std::iter::from_fn(|| v.pop()).collect();
    assert_eq!(drained, ["gamma", "beta", "alpha"]);
    assert!(v.is_empty());
    assert_eq!(v.pop(), None);
}

#[test]
fn test_default_is_unallocated() {
    let v: DynamicArray<u64> = DynamicArray::default();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 0);
    assert!(v.data().is_null());
}

#[test]
fn test_push_capacity_trace() {
    let mut v = DynamicArray::new();
    let mut caps = Vec::new();
    for i in 1..=5 {
        v.push(i);
        caps.push(v.capacity());
    }
    assert_eq!(caps, [1, 2, 4, 4, 8]);
    assert_eq!(v, [1, 2, 3, 4, 5]);
}

#[test]
fn test_fill_constructors_are_exact() {
    let v = DynamicArray::from_elem(3, String::from("x"));
    assert_eq!(v.len(), 3);
    assert_eq!(v.capacity(), 3);
    assert!(v.iter().all(|s| s == "x"));

    let d: DynamicArray<i32> = DynamicArray::with_len(4);
    assert_eq!(d, [0, 0, 0, 0]);
    assert_eq!(d.capacity(), 4);

    let empty = DynamicArray::from_elem(0, 7u8);
    assert!(empty.is_empty());
    assert_eq!(empty.capacity(), 0);
}

#[test]
fn test_fill_rejects_oversized_count() {
    let err = DynamicArray::try_from_elem(max_size::<u32>() + 1, 0u32).unwrap_err();
    assert_eq!(
        err,
        ArrayError::CapacityOverflow {
            requested: max_size::<u32>() + 1,
            max: max_size::<u32>(),
        }
    );
    assert!(DynamicArray::<u64>::try_with_len(usize::MAX).is_err());
}

#[test]
#[should_panic(expected = "capacity overflow")]
fn test_with_capacity_overflow_panics() {
    let _ = DynamicArray::<u64>::with_capacity(usize::MAX);
}

#[test]
fn test_range_constructor() {
    let source = [String::from("a"), String::from("b"), String::from("c")];
    let v = DynamicArray::from_range(source.iter().cloned());
    assert_eq!(v, source);
    assert_eq!(v.capacity(), 3);

    let from_slice = DynamicArray::from(&source[1..]);
    assert_eq!(from_slice, ["b", "c"]);
}

#[test]
fn test_literal_constructor_moves_in_order() {
    let v = dynarray![String::from("one"), String::from("two")];
    assert_eq!(v.capacity(), 2);
    assert_eq!(v, ["one", "two"]);

    let n = dynarray![5u8; 3];
    assert_eq!(n, [5, 5, 5]);

    let e: DynamicArray<u8> = dynarray![];
    assert_eq!(e.capacity(), 0);
}

#[test]
fn test_clone_is_deep() {
    let original = dynarray![vec![1], vec![2]];
    let mut copy = original.clone();
    assert_eq!(copy, original);
    assert_eq!(copy.capacity(), original.capacity());
    copy[0].push(10);
    copy.push(vec![3]);
    assert_eq!(original, [vec![1], vec![2]]);
    assert_eq!(copy, [vec![1, 10], vec![2], vec![3]]);
}

#[test]
fn test_take_leaves_source_empty() {
    let mut source = dynarray![1, 2, 3];
    let block = source.data();
    let moved = source.take();
    assert!(source.is_empty());
    assert_eq!(source.capacity(), 0);
    assert!(source.data().is_null());
    assert_eq!(moved.data(), block);
    assert_eq!(moved, [1, 2, 3]);
}

#[test]
fn test_take_from_drops_previous_contents() {
    let counter = live();
    let mut target: DynamicArray<Tracked> = (0..4).map(|i| Tracked::new(i, &counter)).collect();
    let mut source = dynarray![Tracked::new(9, &counter)];
    let block = source.data();

    target.take_from(&mut source);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(target.data(), block);
    assert_eq!(target[0].id, 9);
    assert_eq!(source.capacity(), 0);
}

#[test]
fn test_assign_variants() {
    let mut v = dynarray![1, 2, 3, 4, 5, 6];
    v.assign(2, 7);
    assert_eq!(v, [7, 7]);
    assert_eq!(v.capacity(), 2);

    v.assign_range(10..13);
    assert_eq!(v, [10, 11, 12]);
    assert_eq!(v.capacity(), 3);

    v.assign_array([0; 5]);
    assert_eq!(v, [0; 5]);
    assert_eq!(v.capacity(), 5);

    let other = dynarray![8, 9];
    v.clone_from(&other);
    assert_eq!(v, other);
}

#[test]
fn test_failed_assign_keeps_contents() {
    let mut v = dynarray![1u64, 2, 3];
    let block = v.data();
    assert!(v.try_assign(usize::MAX, 0).is_err());
    assert_eq!(v, [1, 2, 3]);
    assert_eq!(v.data(), block);
}

#[test]
fn test_panicking_clone_leaves_target_untouched() {
    let counter = live();
    let budget = Arc::new(AtomicUsize::new(usize::MAX));
    let source: DynamicArray<Fragile> = (0..4).map(|_| Fragile::new(&counter, &budget)).collect();
    let mut target = dynarray![Fragile::new(&counter, &budget)];
    assert_eq!(counter.load(Ordering::SeqCst), 5);

    budget.store(2, Ordering::SeqCst);
    let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
    assert!(result.is_err());
    assert_eq!(target.len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 5);
}

#[test]
fn test_at_checks_bounds() {
    let mut v = DynamicArray::from_elem(3, "x");
    assert_eq!(v.at(0), Ok(&"x"));
    assert_eq!(v.at(5), Err(ArrayError::OutOfRange { index: 5, len: 3 }));
    assert_eq!(v.at(3), Err(ArrayError::OutOfRange { index: 3, len: 3 }));
    *v.at_mut(1).unwrap() = "y";
    assert_eq!(v, ["x", "y", "x"]);
    assert!(v.at_mut(3).is_err());
}

#[test]
fn test_front_back_and_unchecked() {
    let mut v = dynarray![1, 2, 3];
    assert_eq!(v.front(), Some(&1));
    assert_eq!(v.back(), Some(&3));
    *v.back_mut().unwrap() = 30;
    *v.front_mut().unwrap() = 10;
    unsafe {
        assert_eq!(*v.front_unchecked(), 10);
        assert_eq!(*v.back_unchecked(), 30);
        assert_eq!(*v.get_unchecked(1), 2);
        *v.get_unchecked_mut(1) = 20;
    }
    assert_eq!(v, [10, 20, 30]);

    let empty: DynamicArray<i32> = DynamicArray::new();
    assert_eq!(empty.front(), None);
    assert_eq!(empty.back(), None);
}

#[test]
fn test_data_pointer() {
    let mut v: DynamicArray<u16> = DynamicArray::with_capacity(4);
    assert!(v.data().is_null());
    assert_eq!(v.capacity(), 4);
    v.push(5);
    assert!(!v.data().is_null());
    unsafe { *v.data_mut() = 6 };
    assert_eq!(v[0], 6);
}

#[test]
fn test_max_size() {
    let v: DynamicArray<u32> = DynamicArray::new();
    assert_eq!(v.max_size(), isize::MAX as usize / 4);
}

#[test]
fn test_reserve_never_shrinks() {
    let mut v = DynamicArray::with_capacity(8);
    v.push(1);
    let block = v.data();
    v.reserve(4);
    assert_eq!(v.capacity(), 8);
    assert_eq!(v.data(), block);
    v.reserve(8);
    assert_eq!(v.capacity(), 8);

    v.reserve(20);
    assert_eq!(v.capacity(), 20);
    assert_eq!(v, [1]);
}

#[test]
fn test_try_reserve_overflow_is_side_effect_free() {
    let mut v = dynarray![1u32, 2];
    let err = v.try_reserve(usize::MAX).unwrap_err();
    assert!(matches!(err, ArrayError::CapacityOverflow { .. }));
    assert_eq!(v.capacity(), 2);
    assert_eq!(v, [1, 2]);
}

#[test]
fn test_grow_and_shrink() {
    let mut v = DynamicArray::with_capacity(2);
    assert_eq!(v.capacity(), 2);
    v.push(1);
    v.push(2);
    v.push(3);
    assert_eq!(v.capacity(), 4);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 3);
    v.clear();
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_shrink_to_fit_empty_releases_block() {
    let mut v: DynamicArray<u8> = DynamicArray::with_capacity(16);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_clear_releases_everything() {
    let counter = live();
    let mut v: DynamicArray<Tracked> = (0..6).map(|i| Tracked::new(i, &counter)).collect();
    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 0);
    assert!(v.data().is_null());
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    v.push(Tracked::new(1, &counter));
    assert_eq!(v.len(), 1);
}

#[test]
fn test_pop_shrinks_below_quarter() {
    let mut v: DynamicArray<u32> = DynamicArray::new();
    for i in 0..16 {
        v.push(i);
    }
    assert_eq!(v.capacity(), 16);
    for _ in 0..12 {
        v.pop();
    }
    // len 4 is not below 16 / 4
    assert_eq!(v.capacity(), 16);
    assert_eq!(v.pop(), Some(3));
    assert_eq!(v.len(), 3);
    assert_eq!(v.capacity(), 3);
    assert_eq!(v, [0, 1, 2]);
}

#[test]
fn test_pop_discard_drops_in_place() {
    let counter = live();
    let mut v: DynamicArray<Tracked> = (0..8).map(|i| Tracked::new(i, &counter)).collect();
    v.pop_discard();
    assert_eq!(counter.load(Ordering::SeqCst), 7);
    assert_eq!(v.back().map(|t| t.id), Some(6));
    for _ in 0..6 {
        v.pop_discard();
    }
    assert_eq!(v.len(), 1);
    assert_eq!(v.capacity(), 1);
    v.pop_discard();
    v.pop_discard();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_emplace_returns_new_element() {
    let mut v: DynamicArray<String> = DynamicArray::new();
    v.emplace("abc").push('d');
    let last = v.emplace_with(|| "xyz".repeat(2));
    last.make_ascii_uppercase();
    assert_eq!(v, ["abcd", "XYZXYZ"]);
    assert_eq!(v.capacity(), 2);
}

#[test]
fn test_emplace_panic_leaves_array_untouched() {
    let mut v = dynarray![1, 2];
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.emplace_with(|| -> i32 { panic!("no value") });
    }));
    assert!(result.is_err());
    assert_eq!(v, [1, 2]);
    assert_eq!(v.capacity(), 2);
}

#[test]
fn test_push_cloned() {
    let mut v = DynamicArray::new();
    let s = String::from("k");
    v.push_cloned(&s);
    v.push_cloned(&s);
    assert_eq!(v, ["k", "k"]);
}

#[test]
fn test_resize_shrink_drops_tail() {
    let counter = live();
    let mut v: DynamicArray<Tracked> = (0..5).map(|i| Tracked::new(i, &counter)).collect();
    let cap = v.capacity();
    v.resize_with(2, || unreachable!());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(v.iter().map(|t| t.id).collect::<Vec<_>>(), [0, 1]);
    assert_eq!(v.capacity(), cap);
}

#[test]
fn test_resize_grow_paths() {
    let mut v = DynamicArray::with_capacity(8);
    v.push(1);
    v.resize(4, 7);
    assert_eq!(v, [1, 7, 7, 7]);
    assert_eq!(v.capacity(), 8);

    v.resize(10, 0);
    assert_eq!(v, [1, 7, 7, 7, 0, 0, 0, 0, 0, 0]);
    assert_eq!(v.capacity(), 10);

    let mut d: DynamicArray<Option<u8>> = dynarray![Some(1)];
    d.resize_default(3);
    assert_eq!(d, [Some(1), None, None]);
    assert_eq!(d.capacity(), 3);
}

#[test]
fn test_resize_panic_is_rolled_back() {
    let counter = live();
    let budget = Arc::new(AtomicUsize::new(usize::MAX));
    let seed = Fragile::new(&counter, &budget);

    // Reallocating branch.
    let mut v = DynamicArray::new();
    v.push(seed.clone());
    budget.store(2, Ordering::SeqCst);
    let result = panic::catch_unwind(AssertUnwindSafe(|| v.resize(6, seed.clone())));
    assert!(result.is_err());
    assert_eq!(v.len(), 1);
    assert_eq!(v.capacity(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // In-place branch.
    budget.store(usize::MAX, Ordering::SeqCst);
    v.reserve(8);
    budget.store(3, Ordering::SeqCst);
    let result = panic::catch_unwind(AssertUnwindSafe(|| v.resize(8, seed.clone())));
    assert!(result.is_err());
    assert_eq!(v.len(), 1);
    assert_eq!(v.capacity(), 8);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_swap() {
    let mut a = dynarray![1, 2, 3];
    let mut b = DynamicArray::with_capacity(10);
    b.push(9);
    let (pa, pb) = (a.data(), b.data());
    a.swap(&mut b);
    assert_eq!(a, [9]);
    assert_eq!(a.capacity(), 10);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!((a.data(), b.data()), (pb, pa));
}

#[test]
fn test_drop_releases_every_value() {
    let counter = live();
    {
        let mut v = DynamicArray::new();
        for i in 0..10 {
            v.push(Tracked::new(i, &counter));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_relocation_moves_without_cloning() {
    let counter = live();
    let mut v = DynamicArray::new();
    for i in 0..33 {
        v.push(Tracked::new(i, &counter));
    }
    assert_eq!(counter.load(Ordering::SeqCst), 33);
    assert_eq!(v.capacity(), 64);
    assert!(v.iter().enumerate().all(|(i, t)| t.id == i));
}

#[test]
fn test_borrowing_and_owning_iteration() {
    let mut v = dynarray![3, 1, 4, 1, 5];
    assert_eq!((&v).into_iter().copied().max(), Some(5));
    for x in &mut v {
        *x *= 10;
    }
    assert_eq!(v.back(), Some(&50));

    let owned: Vec<i32> = v.into_iter().rev().collect();
    assert_eq!(owned, [50, 10, 40, 10, 30]);
}

#[test]
fn test_into_iter_partial_consumption() {
    let counter = live();
    let v: DynamicArray<Tracked> = (0..5).map(|i| Tracked::new(i, &counter)).collect();
    let mut it = v.into_iter();
    assert_eq!(it.len(), 5);
    assert_eq!(it.next().map(|t| t.id), Some(0));
    assert_eq!(it.next_back().map(|t| t.id), Some(4));
    assert_eq!(it.as_slice().len(), 3);
    drop(it);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_extend_and_collect() {
    let mut v: DynamicArray<u8> = (1..=3).collect();
    assert_eq!(v.capacity(), 3);
    v.extend([4, 5]);
    assert_eq!(v.capacity(), 6);
    v.extend(&[6u8]);
    assert_eq!(v, [1, 2, 3, 4, 5, 6]);
    assert_eq!(v.capacity(), 6);
}

#[test]
fn test_mixed_push_and_extend_keep_doubling() {
    let mut v = DynamicArray::new();
    let mut caps = Vec::new();
    v.push(0u32);
    caps.push(v.capacity());
    v.extend([1]);
    caps.push(v.capacity());
    v.push(2);
    caps.push(v.capacity());
    v.extend([3, 4]);
    caps.push(v.capacity());
    assert_eq!(caps, [1, 2, 4, 8]);

    // A hint larger than double the block is honoured exactly.
    v.extend(10..30);
    assert_eq!(v.len(), 25);
    assert_eq!(v.capacity(), 25);
}

#[test]
fn test_zero_sized_elements() {
    let mut v = DynamicArray::new();
    for _ in 0..100 {
        v.push(());
    }
    assert_eq!(v.len(), 100);
    assert_eq!(v.capacity(), 128);
    assert_eq!(v.max_size(), usize::MAX);
    assert_eq!(v.pop(), Some(()));
    v.clear();
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_equality_and_hash() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let a = dynarray![1, 2, 3];
    let mut b = DynamicArray::with_capacity(16);
    b.extend([1, 2, 3]);
    assert_eq!(a, b);
    assert_eq!(a, &[1, 2, 3][..]);

    let hash = |v: &DynamicArray<i32>| {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(&a), hash(&b));
    assert_eq!(format!("{a:?}"), "[1, 2, 3]");
}

#[test]
fn test_concurrency() {
    let mut v = DynamicArray::new();
    for i in 0..100 {
        v.push(i);
    }

    scope(|s| {
        s.spawn(|_| {
            for x in &v {
                let _ = *x;
            }
        });
        s.spawn(|_| {
            let sum: i32 = v.iter().sum();
            assert_eq!(sum, 4950);
        });
    })
    .unwrap();
}

#[test]
fn test_try_push_reports_success() {
    let mut v: DynamicArray<i32> = DynamicArray::new();
    assert!(v.try_push(1).is_ok());
    assert!(v.try_reserve(10).is_ok());
    assert_eq!(v.capacity(), 10);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn test_index_out_of_bounds_panics() {
    let v: DynamicArray<i32> = dynarray![1];
    let _ = v[1];
}
