// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Node subdivision: redistributing an overfull node's entities one level
//! down.
//!
//! An entity moves iff exactly one child cell covers it at the finer
//! level; entities straddling several children stay at the parent, which
//! keeps the parent node alive. Subdivision never fires at the deepest
//! level — oversize nodes there are accepted, never silently split.

use crate::voxtree::geometry::CellGeometry;
use crate::voxtree::index::config::IndexConfig;
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::monitor::IndexMetrics;
use crate::voxtree::store::SpanningPolicy;
use crate::voxtree::voxstream::EntityId;

/// Splits `key` and any children that end up overfull, until every
/// affected node respects the entity limit or sits at `max_depth`.
/// Returns the number of splits performed.
pub(crate) fn maybe_subdivide<K: SpatialKey, I: EntityId, C>(
    state: &mut IndexState<K, I, C>,
    config: &IndexConfig,
    metrics: &IndexMetrics,
    key: K,
) -> usize {
    let mut splits = 0;
    let mut pending = vec![key];
    while let Some(current) = pending.pop() {
        if current.level() >= config.max_depth {
            continue;
        }
        let count = match state.nodes.node(&current) {
            Some(node) => node.len(),
            None => continue,
        };
        if count <= config.max_entities_per_node {
            continue;
        }
        let touched = split_node(state, config, current);
        if !touched.is_empty() {
            metrics.record_split();
            splits += 1;
            pending.extend(touched);
        }
    }
    splits
}

/// Splits one node unconditionally (used by the balancer's 2:1 pass as
/// well as threshold splits). Returns the child keys that received
/// entities; empty when nothing could move.
pub(crate) fn split_node<K: SpatialKey, I: EntityId, C>(
    state: &mut IndexState<K, I, C>,
    config: &IndexConfig,
    key: K,
) -> Vec<K> {
    if key.level() >= config.max_depth {
        return Vec::new();
    }
    let ids: Vec<I> = match state.nodes.node(&key) {
        Some(node) => node.ids().cloned().collect(),
        None => return Vec::new(),
    };

    let mut touched: Vec<K> = Vec::new();
    for id in ids {
        let destination = {
            let entity = match state.entities.get(&id) {
                Some(entity) => entity,
                None => continue,
            };
            child_cover(&key, entity.position, entity.bounds.as_ref(), config)
        };

        // Exactly one covering child: the entity moves down. Anything
        // else (straddler, or a locate edge case) keeps it at the parent.
        let target = match destination {
            ChildCover::Single(child) => child,
            _ => continue,
        };

        if let Some(node) = state.nodes.node_mut(&key) {
            node.remove(&id);
        }
        state.nodes.insert_entity(target, id.clone());
        if let Some(entity) = state.entities.get_mut(&id) {
            entity.remove_key(&key);
            entity.add_key(target);
        }
        if !touched.contains(&target) {
            touched.push(target);
        }
    }
    touched
}

/// Descends from a cover key into already-subdivided nodes: as long as
/// the target node has children and exactly one child covers the entity,
/// the entity belongs one level further down. Keeps incremental inserts
/// and deferred bulk subdivision converging on the same structure.
pub(crate) fn sink_key<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    config: &IndexConfig,
    mut key: K,
    position: crate::voxtree::geometry::Point3,
    bounds: Option<&crate::voxtree::geometry::Aabb>,
) -> K {
    while key.level() < config.max_depth {
        let has_children = match state.nodes.node(&key) {
            Some(node) => node.has_children(),
            None => false,
        };
        if !has_children {
            break;
        }
        match child_cover(&key, position, bounds, config) {
            ChildCover::Single(child) => key = child,
            _ => break,
        }
    }
    key
}

enum ChildCover<K> {
    None,
    Single(K),
    Straddling,
}

/// Which children of `key` cover the entity at the finer level.
fn child_cover<K: SpatialKey>(
    key: &K,
    position: crate::voxtree::geometry::Point3,
    bounds: Option<&crate::voxtree::geometry::Aabb>,
    config: &IndexConfig,
) -> ChildCover<K> {
    if let (Some(aabb), true) = (bounds, config.spanning != SpanningPolicy::None) {
        let mut found: Option<K> = None;
        for i in 0..8u8 {
            let child = key.child(i);
            if child.cell().intersects_aabb(aabb) {
                if found.is_some() {
                    return ChildCover::Straddling;
                }
                found = Some(child);
            }
        }
        return match found {
            Some(child) => ChildCover::Single(child),
            None => ChildCover::None,
        };
    }

    // Point placement: the first child whose cell contains the position.
    for i in 0..8u8 {
        let child = key.child(i);
        if child.contains_point(&position) {
            return ChildCover::Single(child);
        }
    }
    ChildCover::None
}
