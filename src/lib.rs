//! A contiguous growable array that manages its own memory block.
//!
//! [`DynamicArray`] keeps allocation and construction apart: a block of
//! uninitialized slots is allocated to a given capacity, values are written
//! into it one at a time, and only the live prefix is ever dropped. Growth
//! and shrinking always build a complete replacement block before the old one
//! is released.

#[macro_use]
mod macros;

mod array;
pub mod cli;
pub mod error;
mod iter;
mod raw;

pub use array::DynamicArray;
pub use error::{ArrayError, Result};
pub use iter::IntoIter;
pub use raw::max_size;

#[cfg(test)]
mod tests;
