// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The rebalance pass: split, merge, and the 2:1 neighbor rule.

use crate::voxtree::balance::BalancingStrategy;
use crate::voxtree::index::config::IndexConfig;
use crate::voxtree::index::subdivide::{maybe_subdivide, split_node};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::monitor::IndexMetrics;
use crate::voxtree::voxstream::EntityId;
use serde::Serialize;

/// Safety bound on 2:1 propagation rounds.
const MAX_NEIGHBOR_ROUNDS: usize = 16_384;

/// Outcome of one rebalance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebalanceReport {
    pub splits: usize,
    pub merges: usize,
    pub neighbor_splits: usize,
}

/// Runs the full pass over the queued keys (or the whole store when the
/// queue is empty).
pub(crate) fn rebalance<K: SpatialKey, I: EntityId, C>(
    state: &mut IndexState<K, I, C>,
    config: &IndexConfig,
    metrics: &IndexMetrics,
    strategy: &dyn BalancingStrategy<K>,
) -> RebalanceReport {
    let mut report = RebalanceReport::default();

    let mut candidates = strategy.take_dirty();
    if candidates.is_empty() {
        candidates = state.nodes.iter().map(|(k, _)| *k).collect();
    }

    // Splits: overfull nodes go one level down.
    for key in &candidates {
        let should = state
            .nodes
            .node(key)
            .map(|node| strategy.should_split(node.len(), key.level(), config))
            .unwrap_or(false);
        if should {
            report.splits += maybe_subdivide(state, config, metrics, *key);
        }
    }

    // Merges: deepest families first so a collapse can cascade upward.
    let mut parents: Vec<K> = candidates
        .iter()
        .filter_map(|key| key.parent())
        .collect();
    parents.sort_by(|a, b| b.cmp(a));
    parents.dedup();
    for parent in parents {
        if try_merge_family(state, config, strategy, &parent) {
            metrics.record_merge();
            report.merges += 1;
        }
    }

    // 2:1 rule: no cell may border a cell more than one level coarser.
    report.neighbor_splits = enforce_neighbor_rule(state, config, metrics);

    report
}

/// Collapses the children of `parent` into it when the family is
/// underfull, all children are leaves, and the result stays within the
/// entity limit.
fn try_merge_family<K: SpatialKey, I: EntityId, C>(
    state: &mut IndexState<K, I, C>,
    config: &IndexConfig,
    strategy: &dyn BalancingStrategy<K>,
    parent: &K,
) -> bool {
    let (children, family_count, parent_count) = {
        let parent_node = match state.nodes.node(parent) {
            Some(node) => node,
            None => return false,
        };
        if !parent_node.has_children() {
            return false;
        }
        let mut children = Vec::new();
        let mut family_count = 0usize;
        for i in 0..8u8 {
            if !parent_node.has_child(i) {
                continue;
            }
            children.push(parent.child(i));
        }
        for child in &children {
            match state.nodes.node(child) {
                // Grandchildren block the merge.
                Some(node) if node.has_children() => return false,
                Some(node) => {
                    family_count += node.len();
                    // Never lift an entity above its registration level.
                    for id in node.ids() {
                        if let Some(entity) = state.entities.get(id) {
                            if entity.level > parent.level() {
                                return false;
                            }
                        }
                    }
                }
                None => return false,
            }
        }
        (children, family_count, parent_node.len())
    };

    if !strategy.should_merge(family_count, parent_count, config) {
        return false;
    }

    for child in &children {
        let ids: Vec<I> = match state.nodes.node(child) {
            Some(node) => node.ids().cloned().collect(),
            None => continue,
        };
        for id in ids {
            if let Some(node) = state.nodes.node_mut(child) {
                node.remove(&id);
            }
            state.nodes.insert_entity(*parent, id.clone());
            if let Some(entity) = state.entities.get_mut(&id) {
                entity.remove_key(child);
                entity.add_key(*parent);
            }
        }
        state.nodes.prune_upwards(*child);
    }
    true
}

/// Splits coarse leaves bordering much finer ones until the level
/// difference across every face is at most one.
fn enforce_neighbor_rule<K: SpatialKey, I: EntityId, C>(
    state: &mut IndexState<K, I, C>,
    config: &IndexConfig,
    metrics: &IndexMetrics,
) -> usize {
    let mut splits = 0;
    let mut queue: Vec<K> = state
        .nodes
        .iter()
        .filter_map(|(key, node)| (!node.has_children()).then_some(*key))
        .collect();

    let mut rounds = 0;
    while let Some(leaf) = queue.pop() {
        rounds += 1;
        if rounds > MAX_NEIGHBOR_ROUNDS {
            break;
        }
        if !state.nodes.contains_key(&leaf) {
            continue;
        }
        for neighbor in leaf.neighbors() {
            let representative = find_representative(state, neighbor);
            let rep = match representative {
                Some(rep) => rep,
                None => continue,
            };
            if leaf.level().saturating_sub(rep.level()) <= 1 {
                continue;
            }
            let touched = split_node(state, config, rep);
            if touched.is_empty() {
                // Every entity straddles; no structural progress is
                // possible here.
                continue;
            }
            metrics.record_split();
            splits += 1;
            queue.extend(touched);
            queue.push(leaf);
            break;
        }
    }
    splits
}

/// Deepest stored ancestor-or-self of `key`; the cell representing that
/// region in the current tree.
fn find_representative<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    key: K,
) -> Option<K> {
    let mut current = Some(key);
    while let Some(candidate) = current {
        if state.nodes.contains_key(&candidate) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}
