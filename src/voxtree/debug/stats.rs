// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tree statistics over a node snapshot.

use crate::voxtree::index::SpatialIndex;
use crate::voxtree::key::{SpatialKey, MAX_REFINEMENT_LEVEL};
use crate::voxtree::voxstream::EntityId;
use serde::Serialize;

/// Aggregate shape of the tree at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct TreeStats {
    pub node_count: usize,
    pub entity_count: usize,
    /// Deepest level holding a node.
    pub max_depth: u8,
    pub nodes_per_level: Vec<usize>,
    pub entities_per_level: Vec<usize>,
    /// Mean entity references per populated node.
    pub avg_occupancy: f64,
    pub max_occupancy: usize,
    /// Populated leaves over all leaves; 1.0 means no empty interior
    /// fan-out.
    pub populated_leaf_ratio: f64,
}

/// Collects statistics from a consistent snapshot.
pub fn tree_stats<K: SpatialKey, I: EntityId, C: Clone + Send + Sync + 'static>(
    index: &SpatialIndex<K, I, C>,
) -> TreeStats {
    let nodes = index.nodes();
    let levels = MAX_REFINEMENT_LEVEL as usize + 1;
    let mut nodes_per_level = vec![0usize; levels];
    let mut entities_per_level = vec![0usize; levels];
    let mut populated = 0usize;
    let mut references = 0usize;
    let mut max_occupancy = 0usize;
    let mut max_depth = 0u8;
    let mut leaves = 0usize;
    let mut populated_leaves = 0usize;

    for node in &nodes {
        nodes_per_level[node.level as usize] += 1;
        entities_per_level[node.level as usize] += node.entity_ids.len();
        max_depth = max_depth.max(node.level);
        if !node.entity_ids.is_empty() {
            populated += 1;
            references += node.entity_ids.len();
            max_occupancy = max_occupancy.max(node.entity_ids.len());
        }
        if node.child_bitmap == 0 {
            leaves += 1;
            if !node.entity_ids.is_empty() {
                populated_leaves += 1;
            }
        }
    }

    TreeStats {
        node_count: nodes.len(),
        entity_count: index.len(),
        max_depth,
        nodes_per_level,
        entities_per_level,
        avg_occupancy: if populated == 0 {
            0.0
        } else {
            references as f64 / populated as f64
        },
        max_occupancy,
        populated_leaf_ratio: if leaves == 0 {
            0.0
        } else {
            populated_leaves as f64 / leaves as f64
        },
    }
}
