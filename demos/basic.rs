use dynarray::DynamicArray;

fn main() {
    println!("--- Basic Usage Example ---");
    let mut arr = DynamicArray::new();

    // Push elements
    for i in 1..=5 {
        arr.push(i * 10);
        println!("Pushed: {}, len: {}, cap: {}", i * 10, arr.len(), arr.capacity());
    }

    // Iterate using Deref to slice
    println!("Elements: {:?}", &arr[..]);
    println!("at(1) = {:?}, at(9) = {:?}", arr.at(1), arr.at(9));

    arr.resize(8, 0);
    println!("After resize(8, 0): {:?}, cap: {}", arr, arr.capacity());

    // Pop elements; the block shrinks once it is less than a quarter full
    while let Some(val) = arr.pop() {
        println!("Popped: {}, len: {}, cap: {}", val, arr.len(), arr.capacity());
    }
}
