//! In-memory index engine for KorvoDB.
//!
//! This crate provides an ordered key-value index built as a copy-on-write
//! exponential tree: node fanout grows with height (`2^h` children at height
//! `h`), keeping the tree at most [`MAX_TREE_HEIGHT`] levels deep. Every
//! insert reallocates the touched root-to-leaf path instead of mutating in
//! place, and freed node buffers are recycled through an exact-size
//! allocation cache in front of a monotonic arena.
//!
//! Internal nodes store their search keys in Eytzinger (breadth-first) order
//! so the descent is a sequential, cache-friendly array walk; child pointers
//! stay in natural sorted order.
//!
//! # Example
//!
//! ```rust
//! use korvo_index::ExpTree;
//!
//! let mut tree: ExpTree<i64, i64> = ExpTree::new();
//! tree.insert(10, 100).unwrap();
//! tree.insert(20, 200).unwrap();
//!
//! assert_eq!(tree.get(&10), Some(100));
//! assert_eq!(tree.get(&15), None);
//! assert!(tree.insert(10, 101).unwrap()); // replace returns true
//! ```

mod arena;
mod cache;
mod constants;
mod eytzinger;
mod node;
mod tree;

#[cfg(test)]
mod proptests;

pub use constants::MAX_TREE_HEIGHT;
pub use tree::ExpTree;

pub use korvo_common::{IndexConfig, KorvoError, Result};
