// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Ordered node map with ancestor-chain maintenance.
//!
//! Invariant: for every stored key, the full parent chain up to the root
//! exists and each parent's child bit for the next link is set. A node is
//! present iff it holds at least one entity or covers a non-empty
//! descendant; removal prunes emptied chains bottom-up.

use crate::voxtree::key::SpatialKey;
use crate::voxtree::store::node::Node;
use crate::voxtree::voxstream::EntityId;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Key → node map in ascending key order.
#[derive(Debug, Clone)]
pub struct NodeStore<K: SpatialKey, I: EntityId> {
    nodes: BTreeMap<K, Node<I>>,
}

impl<K: SpatialKey, I: EntityId> Default for NodeStore<K, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SpatialKey, I: EntityId> NodeStore<K, I> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, key: &K) -> Option<&Node<I>> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: &K) -> Option<&mut Node<I>> {
        self.nodes.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    /// Ascending iteration over the whole store.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Node<I>)> {
        self.nodes.iter()
    }

    /// Ascending iteration from `key` (inclusive); the seek operation.
    pub fn iter_from<'a>(&'a self, key: &K) -> impl Iterator<Item = (&'a K, &'a Node<I>)> {
        self.nodes
            .range((Bound::Included(*key), Bound::Unbounded))
    }

    /// Nodes within the closed key range.
    pub fn range<'a>(
        &'a self,
        lo: &K,
        hi: &K,
    ) -> impl Iterator<Item = (&'a K, &'a Node<I>)> {
        self.nodes
            .range((Bound::Included(*lo), Bound::Included(*hi)))
    }

    /// All stored descendants of `key`, level by level in ascending key
    /// order. Stops at the first level with no stored nodes: deeper nodes
    /// cannot exist without their ancestor chain.
    pub fn descendants(&self, key: &K) -> Vec<(K, &Node<I>)> {
        let mut found = Vec::new();
        if key.level() >= crate::voxtree::key::MAX_REFINEMENT_LEVEL {
            return found;
        }
        let mut lo = key.first_child();
        let mut hi = key.last_child();
        loop {
            let before = found.len();
            for (k, node) in self.range(&lo, &hi) {
                found.push((*k, node));
            }
            if found.len() == before {
                break;
            }
            if lo.level() >= crate::voxtree::key::MAX_REFINEMENT_LEVEL {
                break;
            }
            lo = lo.first_child();
            hi = hi.last_child();
        }
        found
    }

    /// Registers `id` under `key`, creating the node and its ancestor
    /// chain as needed.
    ///
    /// ## Output
    /// - `true` when the id was new at this key
    pub fn insert_entity(&mut self, key: K, id: I) -> bool {
        let inserted = self
            .nodes
            .entry(key)
            .or_insert_with(Node::new)
            .insert(id);
        self.ensure_chain(key);
        inserted
    }

    /// Creates an empty node (with ancestor chain); used by subdivision
    /// before redistribution.
    pub fn ensure_node(&mut self, key: K) {
        self.nodes.entry(key).or_insert_with(Node::new);
        self.ensure_chain(key);
    }

    fn ensure_chain(&mut self, key: K) {
        let mut current = key;
        while let Some(parent) = current.parent() {
            let child_bit = current
                .child_index()
                .expect("non-root key without child index");
            let node = self.nodes.entry(parent).or_insert_with(Node::new);
            if node.has_child(child_bit) {
                break;
            }
            node.set_child(child_bit);
            current = parent;
        }
    }

    /// Removes `id` from the node at `key`, pruning emptied chains.
    ///
    /// ## Output
    /// - `true` when the id was present
    pub fn remove_entity(&mut self, key: &K, id: &I) -> bool {
        let removed = match self.nodes.get_mut(key) {
            Some(node) => node.remove(id),
            None => false,
        };
        if removed {
            self.prune_upwards(*key);
        }
        removed
    }

    /// Drops the node at `key` if it became prunable, then walks the
    /// chain up clearing child bits.
    pub fn prune_upwards(&mut self, key: K) {
        let mut current = key;
        loop {
            let prunable = match self.nodes.get(&current) {
                Some(node) => node.is_prunable() && current.level() > 0,
                None => false,
            };
            if !prunable {
                break;
            }
            self.nodes.remove(&current);
            let parent = match current.parent() {
                Some(p) => p,
                None => break,
            };
            let child_bit = current
                .child_index()
                .expect("non-root key without child index");
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.clear_child(child_bit);
            }
            current = parent;
        }
        // The root is kept only while it carries entities or children.
        if let Some(root) = self.nodes.get(&K::root()) {
            if root.is_prunable() {
                self.nodes.remove(&K::root());
            }
        }
    }

    /// Drops every node. The balancer uses this for bulk rebuilds.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Rebuilds the store from (key, id) pairs.
    pub fn rebuild_from(&mut self, entries: impl IntoIterator<Item = (K, I)>) {
        self.clear();
        for (key, id) in entries {
            self.insert_entity(key, id);
        }
    }
}
