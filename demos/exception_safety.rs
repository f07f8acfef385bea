use dynarray::DynamicArray;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Tracked(usize, Arc<AtomicUsize>);

impl Clone for Tracked {
    fn clone(&self) -> Self {
        if self.0 == 2 {
            panic!("refusing to clone element 2");
        }
        Tracked(self.0, self.1.clone())
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        println!("Dropping element {}", self.0);
        self.1.fetch_add(1, Ordering::SeqCst);
    }
}

fn main() {
    println!("--- Exception Safety & RAII Example ---");
    let drop_count = Arc::new(AtomicUsize::new(0));

    {
        let mut arr = DynamicArray::new();
        for i in 0..3 {
            arr.push(Tracked(i, drop_count.clone()));
        }
        println!("Array created with 3 elements.");

        // Copying fails on the third element: the two finished copies are
        // dropped and the target keeps its old contents.
        let mut target = DynamicArray::new();
        target.push(Tracked(7, drop_count.clone()));
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| target.clone_from(&arr)));
        println!(
            "clone_from failed: {}, target still holds {} element(s)",
            result.is_err(),
            target.len()
        );
        // Scope ends here, arr and target are dropped
    }

    println!("Total elements dropped: {}", drop_count.load(Ordering::SeqCst));
    assert_eq!(drop_count.load(Ordering::SeqCst), 6);
}
