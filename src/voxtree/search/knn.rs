// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Best-first k-nearest-neighbor search.
//!
//! A min-heap of cells ordered by lower-bound distance drives the
//! traversal; a bounded max-heap keeps the best k candidates. A subtree
//! is pruned once its lower bound exceeds the current k-th distance, so
//! the search touches only the neighborhood of the query point.

use crate::voxtree::geometry::{CellGeometry, Point3};
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{entity_distance_sq, QueryOutput, Tracker};
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// One kNN result.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnHit<I> {
    pub id: I,
    pub distance: f32,
}

/// Max-heap entry: the worst candidate sits on top.
struct Candidate<I> {
    distance_sq: f32,
    id: I,
}

impl<I: EntityId> PartialEq for Candidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: EntityId> Eq for Candidate<I> {}

impl<I: EntityId> Ord for Candidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl<I: EntityId> PartialOrd for Candidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap entry (via `Reverse`): nearest unexplored cell first.
struct Frontier<K> {
    bound_sq: f32,
    key: K,
}

impl<K: SpatialKey> PartialEq for Frontier<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: SpatialKey> Eq for Frontier<K> {}

impl<K: SpatialKey> Ord for Frontier<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bound_sq
            .total_cmp(&other.bound_sq)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl<K: SpatialKey> PartialOrd for Frontier<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) fn search<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    query: &Point3,
    k: usize,
    max_distance: Option<f32>,
    options: &QueryOptions,
    mut on_hit: impl FnMut(&KnnHit<I>) -> bool,
) -> QueryOutput<KnnHit<I>> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut best: BinaryHeap<Candidate<I>> = BinaryHeap::new();
    let mut frontier: BinaryHeap<std::cmp::Reverse<Frontier<K>>> = BinaryHeap::new();
    let mut seen: HashSet<I> = HashSet::new();
    let mut cells: std::collections::HashMap<K, K::Cell> = std::collections::HashMap::new();

    let limit_sq = max_distance.map(|d| d * d);
    let root = K::root();
    if state.nodes.contains_key(&root) {
        cells.insert(root, root.cell());
        frontier.push(std::cmp::Reverse(Frontier {
            bound_sq: 0.0,
            key: root,
        }));
    }

    'traversal: while let Some(std::cmp::Reverse(entry)) = frontier.pop() {
        if !tracker.enter_node() {
            status = QueryStatus::Cancelled;
            break;
        }
        // The nearest unexplored cell cannot improve on a full heap.
        if best.len() == k {
            let worst = best.peek().expect("non-empty heap").distance_sq;
            if entry.bound_sq > worst {
                break;
            }
        }
        let cell = match cells.remove(&entry.key) {
            Some(cell) => cell,
            None => continue,
        };
        let node = match state.nodes.node(&entry.key) {
            Some(node) => node,
            None => continue,
        };

        for id in node.ids() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let entity = match state.entities.get(id) {
                Some(entity) => entity,
                None => continue,
            };
            tracker.test_entity();
            let distance_sq = entity_distance_sq(entity, query);
            if let Some(limit) = limit_sq {
                if distance_sq > limit {
                    continue;
                }
            }
            let candidate = Candidate {
                distance_sq,
                id: id.clone(),
            };
            let accepted = if best.len() < k {
                best.push(candidate);
                true
            } else {
                let worst = best.peek().expect("non-empty heap");
                if candidate.cmp(worst) == Ordering::Less {
                    best.pop();
                    best.push(candidate);
                    true
                } else {
                    false
                }
            };
            if accepted {
                let hit = KnnHit {
                    id: id.clone(),
                    distance: distance_sq.sqrt(),
                };
                if !on_hit(&hit) {
                    status = QueryStatus::Stopped;
                    break 'traversal;
                }
            }
        }

        for i in 0..8u8 {
            if !node.has_child(i) {
                continue;
            }
            let child_key = entry.key.child(i);
            let child_cell = cell.child(i);
            let bound_sq = child_cell.distance_sq_to_point(query);
            if let Some(limit) = limit_sq {
                if bound_sq > limit {
                    continue;
                }
            }
            if best.len() == k {
                let worst = best.peek().expect("non-empty heap").distance_sq;
                if bound_sq > worst {
                    continue;
                }
            }
            cells.insert(child_key, child_cell);
            frontier.push(std::cmp::Reverse(Frontier {
                bound_sq,
                key: child_key,
            }));
        }
    }

    // Ascending (distance, id): the heap order is exactly the result
    // order.
    let data: Vec<KnnHit<I>> = best
        .into_sorted_vec()
        .into_iter()
        .map(|c| KnnHit {
            id: c.id,
            distance: c.distance_sq.sqrt(),
        })
        .collect();
    QueryOutput {
        data,
        status,
        metrics: tracker.finish(),
    }
}
