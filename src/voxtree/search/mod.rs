// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Generic traversal and search engine.
//!
//! Every query is written against the key capability plus the cell
//! geometry capability; nothing above this line distinguishes cubes from
//! tetrahedra. Traversal descends the stored tree from the root node in
//! (key, cell) lockstep, following child bitmaps, and prunes with the
//! cell's conservative geometry while filtering entities exactly.
//!
//! All queries check the cancellation clock at node-visit granularity and
//! return the accumulated prefix on expiry.

pub mod collision;
pub mod frustum;
pub mod knn;
pub mod plane;
pub mod range;
pub mod ray;

pub use collision::{CollisionBody, CollisionPair, ContactManifold};
pub use frustum::FrustumHit;
pub use knn::KnnHit;
pub use plane::PlaneHit;
pub use range::{RangeMode, Region};
pub use ray::RayHit;

#[cfg(test)]
mod search_test;

use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::SpatialKey;
use crate::voxtree::store::Entity;
use crate::voxtree::voxstream::{
    EntityId, QueryClock, QueryMetrics, QueryOptions, QueryStatus,
};

/// Internal result of an engine run; the façade wraps it into the
/// response envelope.
pub(crate) struct QueryOutput<T> {
    pub data: Vec<T>,
    pub status: QueryStatus,
    pub metrics: QueryMetrics,
}

/// Shared bookkeeping: visit counters plus the cancellation clock.
pub(crate) struct Tracker {
    clock: QueryClock,
    nodes_visited: u64,
    entities_tested: u64,
}

impl Tracker {
    pub(crate) fn new(options: &QueryOptions) -> Self {
        Self {
            clock: QueryClock::new(options),
            nodes_visited: 0,
            entities_tested: 0,
        }
    }

    /// One node visit; false once the deadline or token fired.
    pub(crate) fn enter_node(&mut self) -> bool {
        self.nodes_visited += 1;
        !self.clock.expired()
    }

    pub(crate) fn test_entity(&mut self) {
        self.entities_tested += 1;
    }

    pub(crate) fn finish(self) -> QueryMetrics {
        QueryMetrics {
            nodes_visited: self.nodes_visited,
            entities_tested: self.entities_tested,
            processing_time_us: self.clock.elapsed_us(),
        }
    }
}

/// The box an entity occupies: its bounds, or its position as a
/// degenerate box.
pub(crate) fn entity_box<K: SpatialKey, I: EntityId, C>(
    entity: &Entity<K, I, C>,
) -> Aabb {
    entity
        .bounds
        .unwrap_or_else(|| Aabb::point(entity.position))
}

/// Distance from a query point to an entity: point distance, or the
/// nearest point of its bounds.
pub(crate) fn entity_distance_sq<K: SpatialKey, I: EntityId, C>(
    entity: &Entity<K, I, C>,
    query: &Point3,
) -> f32 {
    match &entity.bounds {
        Some(bounds) => bounds.distance_sq_to_point(query),
        None => entity.position.distance_sq(query),
    }
}

