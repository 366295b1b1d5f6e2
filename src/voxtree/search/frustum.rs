// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Frustum culling queries.

use crate::voxtree::geometry::{CellGeometry, Frustum, FrustumClass};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{entity_box, QueryOutput, Tracker};
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::collections::HashSet;

/// One frustum hit; `class` distinguishes fully inside entities from
/// boundary crossers for further processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrustumHit<I> {
    pub id: I,
    pub class: FrustumClass,
}

pub(crate) fn search<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    frustum: &Frustum,
    options: &QueryOptions,
) -> QueryOutput<FrustumHit<I>> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut hits: Vec<(K, I, FrustumClass)> = Vec::new();
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
        if cell.classify_frustum(frustum) == FrustumClass::Outside {
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
            let class = frustum.classify_aabb(&entity_box(entity));
            if class != FrustumClass::Outside {
                hits.push((key, id.clone(), class));
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
    let data: Vec<FrustumHit<I>> = hits
        .into_iter()
        .filter_map(|(_, id, class)| seen.insert(id.clone()).then_some(FrustumHit { id, class }))
        .collect();
    QueryOutput {
        data,
        status,
        metrics: tracker.finish(),
    }
}
