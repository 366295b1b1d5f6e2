// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Pairwise collision detection.
//!
//! Broad phase: entities sharing a node pair up directly, and the walk
//! carries an ancestor stack because spanning registers a bounded entity
//! in every cell it overlaps — two overlapping entities' cells always
//! share a root path. Under `SpanningPolicy::None` that argument fails,
//! so bounded entities additionally sweep their box cover.
//!
//! Narrow phase: delegated to the shape capability after the store lease
//! is released. The built-in test is strict box overlap — touching at
//! zero penetration is NOT a collision.

use crate::voxtree::geometry::{Aabb, Point3, Vector3};
use crate::voxtree::index::config::IndexConfig;
use crate::voxtree::index::IndexState;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::search::{QueryOutput, Tracker};
use crate::voxtree::store::SpanningPolicy;
use crate::voxtree::voxstream::{EntityId, QueryOptions, QueryStatus};
use std::collections::BTreeSet;

/// Collision-relevant view of an entity handed to shape callbacks.
#[derive(Debug, Clone)]
pub struct CollisionBody<I> {
    pub id: I,
    pub position: Point3,
    pub bounds: Option<Aabb>,
}

/// Narrow-phase result.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    pub point: Point3,
    pub penetration: f32,
    pub normal: Vector3,
}

/// One confirmed collision; `a < b` by id.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair<I> {
    pub a: I,
    pub b: I,
    pub contact: ContactManifold,
}

/// Built-in narrow phase: strict box overlap.
///
/// ## Output
/// - Contact at the centre of the intersection box, normal along the
///   axis of least penetration, pointing from `a` towards `b`
/// - `None` for unbounded bodies and zero-penetration contact
pub fn aabb_contact<I>(a: &CollisionBody<I>, b: &CollisionBody<I>) -> Option<ContactManifold> {
    let box_a = a.bounds?;
    let box_b = b.bounds?;
    if !box_a.overlaps_strictly(&box_b) {
        return None;
    }

    let overlap_x = box_a.max.x.min(box_b.max.x) - box_a.min.x.max(box_b.min.x);
    let overlap_y = box_a.max.y.min(box_b.max.y) - box_a.min.y.max(box_b.min.y);
    let overlap_z = box_a.max.z.min(box_b.max.z) - box_a.min.z.max(box_b.min.z);

    let point = Point3::new(
        (box_a.min.x.max(box_b.min.x) + box_a.max.x.min(box_b.max.x)) * 0.5,
        (box_a.min.y.max(box_b.min.y) + box_a.max.y.min(box_b.max.y)) * 0.5,
        (box_a.min.z.max(box_b.min.z) + box_a.max.z.min(box_b.max.z)) * 0.5,
    );

    let center_a = box_a.center();
    let center_b = box_b.center();
    let (penetration, normal) = if overlap_x <= overlap_y && overlap_x <= overlap_z {
        let sign = if center_b.x >= center_a.x { 1.0 } else { -1.0 };
        (overlap_x, Vector3::new(sign, 0.0, 0.0))
    } else if overlap_y <= overlap_z {
        let sign = if center_b.y >= center_a.y { 1.0 } else { -1.0 };
        (overlap_y, Vector3::new(0.0, sign, 0.0))
    } else {
        let sign = if center_b.z >= center_a.z { 1.0 } else { -1.0 };
        (overlap_z, Vector3::new(0.0, 0.0, sign))
    };

    Some(ContactManifold {
        point,
        penetration,
        normal,
    })
}

/// Candidate pairs with their bodies, ascending (min id, max id).
pub(crate) fn broad_phase<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    config: &IndexConfig,
) -> Vec<(CollisionBody<I>, CollisionBody<I>)> {
    let mut pairs: BTreeSet<(I, I)> = BTreeSet::new();

    // Node-sharing pairs, including entities on the ancestor chain.
    let root = K::root();
    if state.nodes.contains_key(&root) {
        let mut ancestors: Vec<I> = Vec::new();
        walk(state, &root, &mut ancestors, &mut pairs);
    }

    // Without spanning, a bounded entity may overlap cells it is not
    // registered in; sweep its box cover explicitly.
    if config.spanning == SpanningPolicy::None {
        for (id, entity) in state.entities.iter() {
            let bounds = match &entity.bounds {
                Some(bounds) => bounds,
                None => continue,
            };
            if let Ok(cover) = K::cover_aabb(bounds, entity.level) {
                for key in cover {
                    collect_column(state, &key, id, &mut pairs);
                }
            }
        }
    }

    pairs
        .into_iter()
        .filter_map(|(a, b)| {
            let body_a = body_of(state, &a)?;
            let body_b = body_of(state, &b)?;
            Some((body_a, body_b))
        })
        .collect()
}

/// Depth-first walk pairing each node's entities with each other and
/// with every entity on the ancestor chain.
fn walk<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    key: &K,
    ancestors: &mut Vec<I>,
    pairs: &mut BTreeSet<(I, I)>,
) {
    let node = match state.nodes.node(key) {
        Some(node) => node,
        None => return,
    };
    let local: Vec<I> = node.ids().cloned().collect();
    for (index, a) in local.iter().enumerate() {
        for b in &local[index + 1..] {
            insert_pair(pairs, a, b);
        }
        for b in ancestors.iter() {
            insert_pair(pairs, a, b);
        }
    }

    let depth = ancestors.len();
    ancestors.extend(local);
    for i in 0..8u8 {
        if node.has_child(i) {
            walk(state, &key.child(i), ancestors, pairs);
        }
    }
    ancestors.truncate(depth);
}

/// Pairs `id` with everything stored at `key`, its ancestors and its
/// descendants.
fn collect_column<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    key: &K,
    id: &I,
    pairs: &mut BTreeSet<(I, I)>,
) {
    let mut chain = Some(*key);
    while let Some(current) = chain {
        if let Some(node) = state.nodes.node(&current) {
            for other in node.ids() {
                if other != id {
                    insert_pair(pairs, id, other);
                }
            }
        }
        chain = current.parent();
    }
    for (_, node) in state.nodes.descendants(key) {
        for other in node.ids() {
            if other != id {
                insert_pair(pairs, id, other);
            }
        }
    }
}

fn insert_pair<I: EntityId>(pairs: &mut BTreeSet<(I, I)>, a: &I, b: &I) {
    if a == b {
        return;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    pairs.insert((lo.clone(), hi.clone()));
}

fn body_of<K: SpatialKey, I: EntityId, C>(
    state: &IndexState<K, I, C>,
    id: &I,
) -> Option<CollisionBody<I>> {
    state.entities.get(id).map(|entity| CollisionBody {
        id: entity.id.clone(),
        position: entity.position,
        bounds: entity.bounds,
    })
}

/// Runs the shape capability over the candidates, outside the lease.
pub(crate) fn narrow_phase<I: EntityId>(
    candidates: Vec<(CollisionBody<I>, CollisionBody<I>)>,
    options: &QueryOptions,
    narrow: impl Fn(&CollisionBody<I>, &CollisionBody<I>) -> Option<ContactManifold>,
) -> QueryOutput<CollisionPair<I>> {
    let mut tracker = Tracker::new(options);
    let mut status = QueryStatus::Complete;
    let mut data = Vec::new();
    for (a, b) in candidates {
        if !tracker.enter_node() {
            status = QueryStatus::Cancelled;
            break;
        }
        tracker.test_entity();
        if let Some(contact) = narrow(&a, &b) {
            data.push(CollisionPair {
                a: a.id,
                b: b.id,
                contact,
            });
        }
    }
    QueryOutput {
        data,
        status,
        metrics: tracker.finish(),
    }
}
