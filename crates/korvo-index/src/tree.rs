//! Copy-on-write exponential-tree engine.
//!
//! The tree owns a node store (arena + size-class cache) and an optional
//! root handle. Lookups descend from the root choosing at each internal
//! node the child whose range covers the key. Inserts descend the same
//! way while recording the path, then rebuild the touched path bottom-up:
//! the leaf is duplicated (with the entry inserted, replaced, or split)
//! and each ancestor is duplicated with the replacement spliced in,
//! splitting where the capacity rule `2^height` demands. The new root is
//! published by a single assignment; only then is the old path released
//! to the allocation cache, so a failed insert leaves the previous tree
//! fully intact.

use std::cmp::Ordering;

use korvo_common::{IndexConfig, Result};

use crate::constants::{node_capacity, LEAF_CAPACITY, MAX_TREE_HEIGHT};
use crate::eytzinger;
use crate::node::{NodePair, NodeStore};

/// Root pointer plus the tree height (leaves are height 1).
#[derive(Clone, Copy)]
struct RootHandle {
    offset: u64,
    height: u32,
}

/// One step of a recorded descent: a node and the natural index chosen in
/// it (the followed child for internal nodes, the entry slot for the leaf).
#[derive(Clone, Copy, Default)]
struct PathEntry {
    offset: u64,
    idx: usize,
}

/// Ordered key-value index over a copy-on-write exponential tree.
///
/// Node fanout grows with height (`2^h` at height `h`), bounding the tree
/// at [`MAX_TREE_HEIGHT`] levels. The tree is single-owner: all mutation
/// goes through `&mut self`, and readers always observe either the full
/// pre-image or the full post-image of an insert.
pub struct ExpTree<K, V> {
    store: NodeStore<K, V>,
    root: Option<RootHandle>,
}

impl<K: Ord + Copy, V: Copy> ExpTree<K, V> {
    /// Creates an empty tree with the default configuration.
    pub fn new() -> Self {
        Self {
            store: NodeStore::with_config(&IndexConfig::default()),
            root: None,
        }
    }

    /// Creates an empty tree with the given configuration.
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: NodeStore::with_config(&config),
            root: None,
        })
    }

    /// Returns the tree height: 0 when empty, 1 while the root is a leaf.
    #[inline]
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |root| root.height)
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Point lookup. Never allocates.
    pub fn get(&self, key: &K) -> Option<V> {
        let root = self.root?;
        let mut offset = root.offset;
        let mut height = root.height;

        while height > 1 {
            let idx = self.child_slot(offset, key);
            offset = self.store.child(offset, idx);
            height -= 1;
        }

        let len = self.store.header(offset).len as usize;
        for i in 0..len {
            match self.store.leaf_key(offset, i).cmp(key) {
                Ordering::Equal => return Some(self.store.leaf_value(offset, i)),
                Ordering::Greater => return None,
                Ordering::Less => {}
            }
        }
        None
    }

    /// Binary-search descent over an internal node's Eytzinger key array.
    ///
    /// Walks from slot 0 until the next step would leave the array, then
    /// converts the stop slot to a natural index. The chosen child is the
    /// greatest natural index whose minimum does not exceed `key`, clamped
    /// to child 0 when `key` precedes every minimum.
    fn child_slot(&self, offset: u64, key: &K) -> usize {
        let len = self.store.header(offset).len as usize;
        let mut e = 0;
        let mut probe = self.store.internal_key(offset, 0);
        loop {
            let next = match key.cmp(&probe) {
                Ordering::Equal => break,
                Ordering::Less => eytzinger::left(e),
                Ordering::Greater => eytzinger::right(e),
            };
            if next >= len {
                break;
            }
            e = next;
            probe = self.store.internal_key(offset, e);
        }

        let linear = eytzinger::to_linear(e, len);
        if probe <= *key {
            linear
        } else {
            linear.saturating_sub(1)
        }
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Inserts `key` or replaces its value.
    ///
    /// Returns `Ok(true)` when the key was already present (value
    /// replaced), `Ok(false)` for a new key. On allocation failure the
    /// tree is unchanged: every node built during the call is returned to
    /// the allocation cache before the error surfaces.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool> {
        let Some(root) = self.root else {
            let offset = self.store.new_leaf_single(key, value)?;
            self.root = Some(RootHandle { offset, height: 1 });
            return Ok(false);
        };

        let mut path = [PathEntry::default(); MAX_TREE_HEIGHT];
        let depth = self.descend(root, &key, &mut path);
        let leaf = path[depth - 1];
        let leaf_len = self.store.header(leaf.offset).len as usize;
        let replacing = leaf.idx < leaf_len && self.store.leaf_key(leaf.offset, leaf.idx) == key;

        let mut created: Vec<u64> = Vec::with_capacity(depth + 2);
        match self.rebuild_path(&path[..depth], root, key, value, replacing, &mut created) {
            Ok(new_root) => {
                // Publish first; the old path is unreachable after this
                // single assignment and only then recycled.
                self.root = Some(new_root);
                for entry in &path[..depth] {
                    self.store.free(entry.offset);
                }
                Ok(replacing)
            }
            Err(err) => {
                for offset in created {
                    self.store.free(offset);
                }
                Err(err)
            }
        }
    }

    /// Records the root-to-leaf path for `key`. The leaf entry's `idx` is
    /// the smallest linear position whose key is `>= key`, or the leaf
    /// length when every key is smaller.
    fn descend(
        &self,
        root: RootHandle,
        key: &K,
        path: &mut [PathEntry; MAX_TREE_HEIGHT],
    ) -> usize {
        let mut offset = root.offset;
        let mut height = root.height;
        let mut depth = 0;

        while height > 1 {
            debug_assert!(depth + 1 < MAX_TREE_HEIGHT);
            let idx = self.child_slot(offset, key);
            path[depth] = PathEntry { offset, idx };
            depth += 1;
            offset = self.store.child(offset, idx);
            height -= 1;
        }

        let len = self.store.header(offset).len as usize;
        let mut idx = len;
        for i in 0..len {
            if self.store.leaf_key(offset, i) >= *key {
                idx = i;
                break;
            }
        }
        path[depth] = PathEntry { offset, idx };
        depth + 1
    }

    /// Builds the replacement path bottom-up and returns the new root
    /// handle. Every allocated node is appended to `created` so the caller
    /// can unwind on failure; nothing in the old tree is modified here.
    fn rebuild_path(
        &mut self,
        path: &[PathEntry],
        root: RootHandle,
        key: K,
        value: V,
        replacing: bool,
        created: &mut Vec<u64>,
    ) -> Result<RootHandle> {
        let leaf = path[path.len() - 1];

        let mut nodes = if replacing {
            NodePair::one(self.store.dupe_leaf_replace(leaf.offset, leaf.idx, value)?)
        } else {
            self.store
                .dupe_insert_or_split_leaf(leaf.offset, leaf.idx, key, value)?
        };
        created.push(nodes.first);
        created.extend(nodes.second);

        let mut height = 2;
        for ancestor in path[..path.len() - 1].iter().rev() {
            nodes = self.store.dupe_insert_or_split_internal(
                ancestor.offset,
                height,
                ancestor.idx,
                nodes,
            )?;
            created.push(nodes.first);
            created.extend(nodes.second);
            height += 1;
        }

        match nodes.second {
            None => Ok(RootHandle {
                offset: nodes.first,
                height: root.height,
            }),
            Some(right) => {
                debug_assert!((root.height as usize) < MAX_TREE_HEIGHT);
                let offset = self
                    .store
                    .new_internal_from_children(&[nodes.first, right])?;
                created.push(offset);
                Ok(RootHandle {
                    offset,
                    height: root.height + 1,
                })
            }
        }
    }

    // =========================================================================
    // Instrumentation
    // =========================================================================

    /// Number of entries, counted by traversal.
    pub fn count(&self) -> usize {
        self.root.map_or(0, |root| self.count_node(root.offset))
    }

    fn count_node(&self, offset: u64) -> usize {
        if self.store.is_leaf(offset) {
            return self.store.header(offset).len as usize;
        }
        let len = self.store.header(offset).len as usize;
        (0..len)
            .map(|i| self.count_node(self.store.child(offset, i)))
            .sum()
    }

    /// Bytes held by nodes reachable from the root, computed by traversal.
    pub fn bytes_used(&self) -> usize {
        self.root.map_or(0, |root| self.bytes_node(root.offset))
    }

    fn bytes_node(&self, offset: u64) -> usize {
        let mut bytes = self.store.node_bytes(offset);
        if !self.store.is_leaf(offset) {
            let len = self.store.header(offset).len as usize;
            for i in 0..len {
                bytes += self.bytes_node(self.store.child(offset, i));
            }
        }
        bytes
    }

    /// Bytes parked in the size-class allocation cache.
    pub fn bytes_in_cache(&self) -> usize {
        self.store.bytes_in_cache()
    }

    /// Validates structural invariants (ordering, min-consistency,
    /// capacity, height). Intended for tests and debugging.
    pub fn check_invariants(&self) -> bool {
        let Some(root) = self.root else {
            return true;
        };
        if root.height as usize > MAX_TREE_HEIGHT {
            return false;
        }
        let mut keys = Vec::new();
        if !self.check_node(root.offset, root.height, &mut keys) {
            return false;
        }
        keys.windows(2).all(|pair| pair[0] < pair[1])
    }

    fn check_node(&self, offset: u64, height: u32, keys: &mut Vec<K>) -> bool {
        let len = self.store.header(offset).len as usize;
        if len == 0 {
            return false;
        }

        if self.store.is_leaf(offset) {
            if height != 1 || len > LEAF_CAPACITY {
                return false;
            }
            for i in 0..len {
                keys.push(self.store.leaf_key(offset, i));
            }
            return true;
        }

        if height < 2 || len > node_capacity(height) {
            return false;
        }
        for i in 0..len {
            let child = self.store.child(offset, i);
            let slot = eytzinger::from_linear(i, len);
            if self.store.internal_key(offset, slot) != self.store.min_key(child) {
                return false;
            }
            if !self.check_node(child, height - 1, keys) {
                return false;
            }
        }
        true
    }
}

impl<K: Ord + Copy, V: Copy> Default for ExpTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
