// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Tree balancing: split/merge strategy and the rebalance pass.
//!
//! The strategy queues keys affected by mutations; `rebalance` drains the
//! queue under the writer lease, splits overfull nodes, merges underfull
//! sibling families and restores the 2:1 neighbor rule. Readers keep
//! their snapshot semantics — the whole pass runs inside one writer
//! section.

pub mod balancer;

pub use balancer::RebalanceReport;
pub(crate) use balancer::rebalance;


use crate::voxtree::index::config::IndexConfig;
use crate::voxtree::key::SpatialKey;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Split/merge policy and the dirty-key queue.
pub trait BalancingStrategy<K: SpatialKey>: Send + Sync {
    /// Records a key touched by insert/update/remove.
    fn note_change(&self, key: &K);

    /// Drains the queued keys.
    fn take_dirty(&self) -> Vec<K>;

    /// True when a node of `entity_count` at `level` should split.
    fn should_split(&self, entity_count: usize, level: u8, config: &IndexConfig) -> bool;

    /// True when a sibling family totalling `family_count` entities
    /// (with `parent_count` already at the parent) should merge.
    fn should_merge(
        &self,
        family_count: usize,
        parent_count: usize,
        config: &IndexConfig,
    ) -> bool;
}

/// Reacts to mutations by queuing affected nodes; splits at the entity
/// limit and merges when a whole family fits the merge threshold.
#[derive(Debug, Default)]
pub struct DefaultBalancingStrategy<K: SpatialKey> {
    dirty: Mutex<BTreeSet<K>>,
}

impl<K: SpatialKey> DefaultBalancingStrategy<K> {
    pub fn new() -> Self {
        Self {
            dirty: Mutex::new(BTreeSet::new()),
        }
    }
}

impl<K: SpatialKey> BalancingStrategy<K> for DefaultBalancingStrategy<K> {
    fn note_change(&self, key: &K) {
        if let Ok(mut dirty) = self.dirty.lock() {
            dirty.insert(*key);
        }
    }

    fn take_dirty(&self) -> Vec<K> {
        match self.dirty.lock() {
            Ok(mut dirty) => std::mem::take(&mut *dirty).into_iter().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn should_split(&self, entity_count: usize, level: u8, config: &IndexConfig) -> bool {
        entity_count > config.max_entities_per_node && level < config.max_depth
    }

    fn should_merge(
        &self,
        family_count: usize,
        parent_count: usize,
        config: &IndexConfig,
    ) -> bool {
        family_count <= config.effective_merge_threshold()
            && family_count + parent_count <= config.max_entities_per_node
    }
}
