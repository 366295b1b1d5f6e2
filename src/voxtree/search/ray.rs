// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Ray queries.
//!
//! Traversal prunes by the cell's forward-ray interval, so origins
//! outside the domain enter through the slab pre-step naturally. Point
//! entities register a hit when they lie on the ray within the fixed
//! tolerance; bounded entities report their slab entry parameter.

use crate::voxtree::geometry::{CellGeometry, Ray3};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{QueryOutput, Tracker};
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::collections::HashSet;

/// One ray hit at parameter `t` (Euclidean distance from the origin).
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit<I> {
    pub id: I,
    pub t: f32,
}

pub(crate) fn search<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    ray: &Ray3,
    max_distance: Option<f32>,
    options: &QueryOptions,
    mut on_hit: impl FnMut(&RayHit<I>) -> bool,
) -> QueryOutput<RayHit<I>> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut hits: Vec<RayHit<I>> = Vec::new();
    let mut seen: HashSet<I> = HashSet::new();
    let mut stack: Vec<(K, K::Cell)> = Vec::new();

    let root = K::root();
    if state.nodes.contains_key(&root) {
        stack.push((root, root.cell()));
    }

    'traversal: while let Some((key, cell)) = stack.pop() {
        if !tracker.enter_node() {
            status = QueryStatus::Cancelled;
            break;
        }
        let entered = match cell.ray_interval(ray) {
            Some((t_entry, _)) => t_entry,
            None => continue,
        };
        if let Some(limit) = max_distance {
            if entered > limit {
                continue;
            }
        }
        let node = match state.nodes.node(&key) {
            Some(node) => node,
            None => continue,
        };
        for id in node.ids() {
            if seen.contains(id) {
                continue;
            }
            let entity = match state.entities.get(id) {
                Some(entity) => entity,
                None => continue,
            };
            tracker.test_entity();
            let t = match &entity.bounds {
                Some(bounds) => ray.intersect_aabb(bounds).map(|(t_entry, _)| t_entry),
                None => ray.hit_point(&entity.position),
            };
            let t = match t {
                Some(t) => t,
                None => continue,
            };
            if let Some(limit) = max_distance {
                if t > limit {
                    continue;
                }
            }
            seen.insert(id.clone());
            let hit = RayHit { id: id.clone(), t };
            let keep_going = on_hit(&hit);
            hits.push(hit);
            if !keep_going {
                status = QueryStatus::Stopped;
                break 'traversal;
            }
        }
        for i in 0..8u8 {
            if node.has_child(i) {
                stack.push((key.child(i), cell.child(i)));
            }
        }
    }

    hits.sort_by(|a, b| a.t.total_cmp(&b.t).then_with(|| a.id.cmp(&b.id)));
    QueryOutput {
        data: hits,
        status,
        metrics: tracker.finish(),
    }
}
