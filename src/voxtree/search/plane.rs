// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Plane queries.
//!
//! Traversal descends cells whose signed-distance interval straddles zero
//! or lies on the requested side; entities are classified exactly against
//! their own box (or position) and must match the requested side.

use crate::voxtree::geometry::{CellGeometry, Plane, PlaneSide};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{QueryOutput, Tracker};
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::collections::HashSet;

/// One plane hit with the entity's signed distance at its position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneHit<I> {
    pub id: I,
    pub distance: f32,
}

pub(crate) fn search<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    plane: &Plane,
    side: PlaneSide,
    options: &QueryOptions,
) -> QueryOutput<PlaneHit<I>> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut hits: Vec<(K, I, f32)> = Vec::new();
    let mut stack: Vec<(K, K::Cell)> = Vec::new();

    let root = K::root();
    if state.nodes.contains_key(&root) {
        stack.push((root, root.cell()));
    }

    while let Some((key, cell)) = stack.pop() {
        if !tracker.enter_node() {
            status = QueryStatus::Cancelled;
            break;
        }
        let cell_side = cell.classify_plane(plane);
        if cell_side != PlaneSide::Straddling && cell_side != side {
            continue;
        }
        let node = match state.nodes.node(&key) {
            Some(node) => node,
            None => continue,
        };
        for id in node.ids() {
            let entity = match state.entities.get(id) {
                Some(entity) => entity,
                None => continue,
            };
            tracker.test_entity();
            let entity_side = match &entity.bounds {
                Some(bounds) => plane.classify_aabb(bounds),
                None => plane.classify_point(&entity.position),
            };
            if entity_side == side {
                hits.push((key, id.clone(), plane.signed_distance(&entity.position)));
            }
        }
        for i in 0..8u8 {
            if node.has_child(i) {
                stack.push((key.child(i), cell.child(i)));
            }
        }
    }

    hits.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    let mut seen: HashSet<I> = HashSet::new();
    let data: Vec<PlaneHit<I>> = hits
        .into_iter()
        .filter_map(|(_, id, distance)| {
            seen.insert(id.clone())
                .then_some(PlaneHit { id, distance })
        })
        .collect();
    QueryOutput {
        data,
        status,
        metrics: tracker.finish(),
    }
}
