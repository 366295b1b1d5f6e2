// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Range queries over boxes and spheres.

use crate::voxtree::geometry::{Aabb, CellGeometry, Sphere};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{entity_box, QueryOutput, Tracker};
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::collections::HashSet;

/// Query region.
#[derive(Debug, Clone, Copy)]
pub enum Region {
    Aabb(Aabb),
    Sphere(Sphere),
}

/// Match mode: fully contained entities only, or any overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Contained,
    Intersecting,
}

impl Region {
    /// Conservative cell test; admits false positives only.
    fn may_intersect_cell<G: CellGeometry>(&self, cell: &G) -> bool {
        match self {
            Region::Aabb(aabb) => cell.intersects_aabb(aabb),
            Region::Sphere(sphere) => cell.intersects_sphere(sphere),
        }
    }

    /// Exact entity test.
    fn matches(&self, entity_aabb: &Aabb, mode: RangeMode) -> bool {
        match (self, mode) {
            (Region::Aabb(region), RangeMode::Intersecting) => region.intersects(entity_aabb),
            (Region::Aabb(region), RangeMode::Contained) => region.contains_aabb(entity_aabb),
            (Region::Sphere(sphere), RangeMode::Intersecting) => {
                entity_aabb.intersects_sphere(sphere)
            }
            (Region::Sphere(sphere), RangeMode::Contained) => sphere.contains_aabb(entity_aabb),
        }
    }
}

pub(crate) fn search<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    region: &Region,
    mode: RangeMode,
    options: &QueryOptions,
) -> QueryOutput<I> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut hits: Vec<(K, I)> = Vec::new();
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
        if !region.may_intersect_cell(&cell) {
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
            if region.matches(&entity_box(entity), mode) {
                hits.push((key, id.clone()));
            }
        }
        for i in 0..8u8 {
            if node.has_child(i) {
                stack.push((key.child(i), cell.child(i)));
            }
        }
    }

    // Ascending (key, id), first covering key per entity.
    hits.sort();
    let mut seen: HashSet<I> = HashSet::new();
    let data: Vec<I> = hits
        .into_iter()
        .filter_map(|(_, id)| seen.insert(id.clone()).then_some(id))
        .collect();
    QueryOutput {
        data,
        status,
        metrics: tracker.finish(),
    }
}
