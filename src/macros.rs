/// Builds a [`DynamicArray`](crate::DynamicArray) from a literal sequence, or
/// from a value and a count.
///
/// ```
/// use dynarray::dynarray;
///
/// let words = dynarray!["a", "b", "c"];
/// assert_eq!(words.capacity(), 3);
///
/// let zeros = dynarray![0u8; 4];
/// assert_eq!(zeros, [0, 0, 0, 0]);
/// ```
#[macro_export]
macro_rules! dynarray {
    () => {
        $crate::DynamicArray::new()
    };
    ($value:expr; $count:expr) => {
        $crate::DynamicArray::from_elem($count, $value)
    };
    ($($value:expr),+ $(,)?) => {
        $crate::DynamicArray::from([$($value),+])
    };
}
