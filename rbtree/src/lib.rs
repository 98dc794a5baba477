#![deny(rust_2018_idioms)]

//! Red-black tree and the unbalanced binary search tree it is built on.
//!
//! Both trees store their nodes in a slab arena and share one structural
//! core: search, traversal, structural insert/unlink and rotations. The
//! red-black tree adds node colors and the fixups that keep its height
//! logarithmic.

mod binary_search_tree;
mod error;
mod node;
mod raw;
mod red_black_tree;

pub use binary_search_tree::BinarySearchTree;
pub use error::InvariantError;
pub use node::Color;
pub use raw::Iter;
pub use red_black_tree::RedBlackTree;
