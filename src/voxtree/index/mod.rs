// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The index façade.
//!
//! `SpatialIndex` owns the node store, the entity manager and the
//! configuration behind one reader/writer lease: many concurrent readers,
//! one writer. Queries materialise their results before returning, so
//! they never expose index internals or hold the lease beyond the call.
//!
//! `Octree` and `Tetree` are the two concrete structures; everything in
//! between is generic over the key capability.

pub mod config;
pub(crate) mod subdivide;

#[cfg(test)]
mod index_test;

pub use config::IndexConfig;

use crate::voxtree::balance::{BalancingStrategy, DefaultBalancingStrategy, RebalanceReport};
use crate::voxtree::geometry::{
    Aabb, CellGeometry, Frustum, Plane, PlaneSide, Point3, Ray3, Sphere,
};
use crate::voxtree::key::{MortonKey, SpatialKey, TetreeKey};
use crate::voxtree::monitor::{self, IndexMetrics, LogLevel, MetricsSnapshot};
use crate::voxtree::search::{
    self, CollisionPair, ContactManifold, CollisionBody, FrustumHit, KnnHit, PlaneHit,
    RangeMode, RayHit, Region,
};
use crate::voxtree::store::{cover_keys, Entity, EntityManager, NodeStore};
use crate::voxtree::voxstream::{
    invalid_input, EntityId, IdGenerator, QueryOptions, SequentialIdGenerator, VoxResponse,
    VoxResult,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Everything guarded by the store lease.
#[derive(Debug)]
pub(crate) struct IndexState<K: SpatialKey, I: EntityId, C> {
    pub(crate) nodes: NodeStore<K, I>,
    pub(crate) entities: EntityManager<K, I, C>,
}

impl<K: SpatialKey, I: EntityId, C> IndexState<K, I, C> {
    fn new() -> Self {
        Self {
            nodes: NodeStore::new(),
            entities: EntityManager::new(),
        }
    }
}

/// Snapshot of one stored node; owned, never borrowing the index.
#[derive(Debug, Clone)]
pub struct NodeSnapshot<K: SpatialKey, I: EntityId> {
    pub key: K,
    pub level: u8,
    pub aabb: Aabb,
    pub entity_ids: Vec<I>,
    pub child_bitmap: u8,
}

/// Snapshot of one entity.
#[derive(Debug, Clone)]
pub struct EntityView<K: SpatialKey, I: EntityId, C> {
    pub id: I,
    pub position: Point3,
    pub bounds: Option<Aabb>,
    pub content: C,
    pub level: u8,
    pub keys: Vec<K>,
}

/// In-memory spatial index over one key realisation.
pub struct SpatialIndex<K: SpatialKey, I: EntityId, C> {
    state: RwLock<IndexState<K, I, C>>,
    id_gen: Arc<dyn IdGenerator<I>>,
    strategy: Box<dyn BalancingStrategy<K>>,
    config: IndexConfig,
    metrics: IndexMetrics,
}

/// Cubic octree on the Morton curve.
pub type Octree<I, C> = SpatialIndex<MortonKey, I, C>;

/// Tetrahedral tree on the TM curve.
pub type Tetree<I, C> = SpatialIndex<TetreeKey, I, C>;

impl<K: SpatialKey, C: Clone + Send + Sync + 'static> SpatialIndex<K, u64, C> {
    /// Index with sequential `u64` ids.
    pub fn new(config: IndexConfig) -> VoxResult<Self> {
        Self::with_generator(config, Arc::new(SequentialIdGenerator::new()))
    }
}

impl<K: SpatialKey, C: Clone + Send + Sync + 'static> SpatialIndex<K, uuid::Uuid, C> {
    /// Index with UUID v4 ids.
    pub fn with_uuid_ids(config: IndexConfig) -> VoxResult<Self> {
        Self::with_generator(
            config,
            Arc::new(crate::voxtree::voxstream::UuidIdGenerator::new()),
        )
    }
}

impl<K: SpatialKey, I: EntityId, C: Clone + Send + Sync + 'static> SpatialIndex<K, I, C> {
    /// Index with a caller-supplied id generator.
    pub fn with_generator(
        config: IndexConfig,
        id_gen: Arc<dyn IdGenerator<I>>,
    ) -> VoxResult<Self> {
        config.validate()?;
        monitor::log(
            LogLevel::NOTICE,
            &format!("{} index initialised", K::kind_name()),
        );
        Ok(Self {
            state: RwLock::new(IndexState::new()),
            id_gen,
            strategy: Box::new(DefaultBalancingStrategy::new()),
            config,
            metrics: IndexMetrics::new(),
        })
    }

    /// Replaces the balancing strategy (builder style, before sharing).
    pub fn with_strategy(mut self, strategy: Box<dyn BalancingStrategy<K>>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, IndexState<K, I, C>> {
        self.state.read().expect("index lease poisoned")
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, IndexState<K, I, C>> {
        self.state.write().expect("index lease poisoned")
    }

    pub(crate) fn id_generator(&self) -> &Arc<dyn IdGenerator<I>> {
        &self.id_gen
    }

    pub(crate) fn metrics_ref(&self) -> &IndexMetrics {
        &self.metrics
    }

    pub(crate) fn strategy_ref(&self) -> &dyn BalancingStrategy<K> {
        self.strategy.as_ref()
    }

    // == MUTATIONS ==

    /// Inserts a point entity at the configured default level.
    pub fn insert(&self, position: Point3, content: C) -> VoxResult<I> {
        self.insert_entity(None, position, None, content, self.config.default_level)
    }

    /// Inserts a point entity at an explicit level.
    pub fn insert_at_level(&self, position: Point3, content: C, level: u8) -> VoxResult<I> {
        self.insert_entity(None, position, None, content, level)
    }

    /// Inserts a bounded entity; the cover follows the spanning policy.
    pub fn insert_bounded(
        &self,
        position: Point3,
        bounds: Aabb,
        content: C,
    ) -> VoxResult<I> {
        self.insert_entity(
            None,
            position,
            Some(bounds),
            content,
            self.config.default_level,
        )
    }

    /// Inserts a bounded entity at an explicit level.
    pub fn insert_bounded_at_level(
        &self,
        position: Point3,
        bounds: Aabb,
        content: C,
        level: u8,
    ) -> VoxResult<I> {
        self.insert_entity(None, position, Some(bounds), content, level)
    }

    /// Inserts under a caller-chosen id.
    ///
    /// ## Error Conditions
    /// - `Conflict` when the id is already present
    pub fn insert_with_id(
        &self,
        id: I,
        position: Point3,
        bounds: Option<Aabb>,
        content: C,
    ) -> VoxResult<I> {
        self.insert_entity(Some(id), position, bounds, content, self.config.default_level)
    }

    fn insert_entity(
        &self,
        id: Option<I>,
        position: Point3,
        bounds: Option<Aabb>,
        content: C,
        level: u8,
    ) -> VoxResult<I> {
        position.validate()?;
        if let Some(b) = &bounds {
            b.validate()?;
        }
        if level > self.config.max_depth {
            return Err(invalid_input(
                "level",
                format!("{}", level),
                format!("must not exceed max_depth {}", self.config.max_depth),
            ));
        }
        let cover: Vec<K> = cover_keys(
            &position,
            bounds.as_ref(),
            level,
            self.config.spanning,
            self.config.max_depth,
            self.config.max_span_cells,
        )?;
        let id = id.unwrap_or_else(|| self.id_gen.next_id());

        let mut state = self.write_state();
        let sunk: std::collections::BTreeSet<K> = cover
            .iter()
            .map(|key| {
                subdivide::sink_key(&state, &self.config, *key, position, bounds.as_ref())
            })
            .collect();
        let mut entity = Entity::new(id.clone(), position, bounds, content, level);
        entity.set_keys(sunk.iter().copied());
        state.entities.insert(entity)?;
        for key in &sunk {
            state.nodes.insert_entity(*key, id.clone());
            self.strategy.note_change(key);
        }
        for key in &sunk {
            subdivide::maybe_subdivide(&mut state, &self.config, &self.metrics, *key);
        }
        self.metrics.record_insert();
        Ok(id)
    }

    /// Moves an entity; position/bounds change recomputes the cover.
    ///
    /// ## Behaviour
    /// - Identical position and bounds leave the cover-set untouched.
    ///
    /// ## Error Conditions
    /// - `NotFound` for a missing id, `InvalidInput` for bad geometry
    pub fn update(&self, id: &I, position: Point3, bounds: Option<Aabb>) -> VoxResult<()> {
        position.validate()?;
        if let Some(b) = &bounds {
            b.validate()?;
        }

        let mut state = self.write_state();
        let level = state.entities.expect(id, "update")?.level;
        let cover: Vec<K> = cover_keys(
            &position,
            bounds.as_ref(),
            level,
            self.config.spanning,
            self.config.max_depth,
            self.config.max_span_cells,
        )?;

        let new: std::collections::BTreeSet<K> = cover
            .iter()
            .map(|key| {
                subdivide::sink_key(&state, &self.config, *key, position, bounds.as_ref())
            })
            .collect();
        let (departed, joined): (Vec<K>, Vec<K>) = {
            let entity = state.entities.expect_mut(id, "update")?;
            entity.position = position;
            entity.bounds = bounds;
            let old = entity.keys_set().clone();
            if old == new {
                // Re-computation is allowed; the cover-set must not
                // change for a no-op update.
                self.metrics.record_update();
                return Ok(());
            }
            let departed = old.difference(&new).copied().collect();
            let joined = new.difference(&old).copied().collect();
            entity.set_keys(new);
            (departed, joined)
        };

        for key in &departed {
            state.nodes.remove_entity(key, id);
            self.strategy.note_change(key);
        }
        for key in &joined {
            state.nodes.insert_entity(*key, id.clone());
            self.strategy.note_change(key);
        }
        for key in &joined {
            subdivide::maybe_subdivide(&mut state, &self.config, &self.metrics, *key);
        }
        self.metrics.record_update();
        Ok(())
    }

    /// Removes an entity, returning its content.
    ///
    /// ## Error Conditions
    /// - `NotFound` for a missing id
    pub fn remove(&self, id: &I) -> VoxResult<C> {
        let mut state = self.write_state();
        let entity = state.entities.remove(id)?;
        for key in entity.keys() {
            state.nodes.remove_entity(key, id);
            self.strategy.note_change(key);
        }
        self.metrics.record_remove();
        Ok(entity.content)
    }

    // == LOOKUPS ==

    pub fn contains(&self, id: &I) -> bool {
        self.read_state().entities.contains(id)
    }

    /// Cloned entity view; `None` for unknown ids.
    pub fn get(&self, id: &I) -> Option<EntityView<K, I, C>> {
        let state = self.read_state();
        state.entities.get(id).map(|entity| EntityView {
            id: entity.id.clone(),
            position: entity.position,
            bounds: entity.bounds,
            content: entity.content.clone(),
            level: entity.level,
            keys: entity.keys().copied().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.read_state().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().entities.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.read_state().nodes.len()
    }

    /// Snapshot of every node in ascending key order.
    pub fn nodes(&self) -> Vec<NodeSnapshot<K, I>> {
        let state = self.read_state();
        state
            .nodes
            .iter()
            .map(|(key, node)| NodeSnapshot {
                key: *key,
                level: key.level(),
                aabb: key.cell().aabb(),
                entity_ids: node.ids().cloned().collect(),
                child_bitmap: node.child_bitmap(),
            })
            .collect()
    }

    /// Snapshot of every entity, unordered.
    pub fn entities(&self) -> Vec<EntityView<K, I, C>> {
        let state = self.read_state();
        state
            .entities
            .iter()
            .map(|(_, entity)| EntityView {
                id: entity.id.clone(),
                position: entity.position,
                bounds: entity.bounds,
                content: entity.content.clone(),
                level: entity.level,
                keys: entity.keys().copied().collect(),
            })
            .collect()
    }

    /// Counter snapshot including TM-cache totals.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // == QUERIES ==

    /// k nearest entities by Euclidean distance, ascending (distance,
    /// id).
    pub fn knn(
        &self,
        query: &Point3,
        k: usize,
        max_distance: Option<f32>,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<KnnHit<I>>>> {
        self.knn_with(query, k, max_distance, options, |_| true)
    }

    /// As `knn`, with a callback invoked per accepted candidate; return
    /// false to stop early with the accumulated prefix.
    pub fn knn_with(
        &self,
        query: &Point3,
        k: usize,
        max_distance: Option<f32>,
        options: &QueryOptions,
        on_hit: impl FnMut(&KnnHit<I>) -> bool,
    ) -> VoxResult<VoxResponse<Vec<KnnHit<I>>>> {
        query.validate()?;
        if k == 0 {
            return Err(invalid_input("k", "0", "must be at least 1"));
        }
        if let Some(d) = max_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(invalid_input(
                    "max_distance",
                    format!("{}", d),
                    "must be finite and non-negative",
                ));
            }
        }
        self.metrics.record_knn();
        let state = self.read_state();
        let output = search::knn::search(&state, query, k, max_distance, options, on_hit);
        Ok(VoxResponse::new(output.data, "search::knn")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Entities within a box, ascending (first covering key, id).
    pub fn range_aabb(
        &self,
        region: &Aabb,
        mode: RangeMode,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<I>>> {
        region.validate()?;
        self.metrics.record_range();
        let state = self.read_state();
        let output = search::range::search(&state, &Region::Aabb(*region), mode, options);
        Ok(VoxResponse::new(output.data, "search::range")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Entities within a sphere.
    pub fn range_sphere(
        &self,
        region: &Sphere,
        mode: RangeMode,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<I>>> {
        region.validate()?;
        self.metrics.record_range();
        let state = self.read_state();
        let output = search::range::search(&state, &Region::Sphere(*region), mode, options);
        Ok(VoxResponse::new(output.data, "search::range")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Entities hit by a ray, ascending (t, id).
    pub fn ray_query(
        &self,
        ray: &Ray3,
        max_distance: Option<f32>,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<RayHit<I>>>> {
        self.ray_query_with(ray, max_distance, options, |_| true)
    }

    /// As `ray_query`, with an early-termination callback.
    pub fn ray_query_with(
        &self,
        ray: &Ray3,
        max_distance: Option<f32>,
        options: &QueryOptions,
        on_hit: impl FnMut(&RayHit<I>) -> bool,
    ) -> VoxResult<VoxResponse<Vec<RayHit<I>>>> {
        if let Some(d) = max_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(invalid_input(
                    "max_distance",
                    format!("{}", d),
                    "must be finite and non-negative",
                ));
            }
        }
        self.metrics.record_ray();
        let state = self.read_state();
        let output = search::ray::search(&state, ray, max_distance, options, on_hit);
        Ok(VoxResponse::new(output.data, "search::ray")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Entities on the requested side of a plane (or straddling it),
    /// ascending (first covering key, id).
    pub fn plane_query(
        &self,
        plane: &Plane,
        side: PlaneSide,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<PlaneHit<I>>>> {
        self.metrics.record_plane();
        let state = self.read_state();
        let output = search::plane::search(&state, plane, side, options);
        Ok(VoxResponse::new(output.data, "search::plane")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Entities inside or crossing a frustum, ascending (first covering
    /// key, id).
    pub fn frustum_query(
        &self,
        frustum: &Frustum,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<FrustumHit<I>>>> {
        self.metrics.record_frustum();
        let state = self.read_state();
        let output = search::frustum::search(&state, frustum, options);
        Ok(VoxResponse::new(output.data, "search::frustum")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    /// Unique colliding pairs, ascending (min id, max id), using the
    /// built-in strict box overlap as the narrow phase.
    pub fn collisions(
        &self,
        options: &QueryOptions,
    ) -> VoxResult<VoxResponse<Vec<CollisionPair<I>>>> {
        self.collisions_with(options, search::collision::aabb_contact)
    }

    /// As `collisions`, delegating the narrow phase to a caller-supplied
    /// shape test. The store lease is released before the first pair
    /// test runs.
    pub fn collisions_with(
        &self,
        options: &QueryOptions,
        narrow: impl Fn(&CollisionBody<I>, &CollisionBody<I>) -> Option<ContactManifold>,
    ) -> VoxResult<VoxResponse<Vec<CollisionPair<I>>>> {
        self.metrics.record_collision();
        let candidates = {
            let state = self.read_state();
            search::collision::broad_phase(&state, &self.config)
        };
        let output = search::collision::narrow_phase(candidates, options, narrow);
        Ok(VoxResponse::new(output.data, "search::collision")
            .with_status(output.status)
            .with_metrics(output.metrics))
    }

    // == BULK OPERATIONS ==

    /// Inserts many point entities through the staged pipeline. Returned
    /// ids match input order; the commit is all-or-nothing.
    pub fn bulk_insert(&self, points: Vec<(Point3, C)>) -> VoxResult<Vec<I>> {
        let rows = points
            .into_iter()
            .map(|(position, content)| crate::voxtree::bulk::pipeline::BulkRow {
                position,
                bounds: None,
                content,
            })
            .collect();
        crate::voxtree::bulk::pipeline::execute(self, rows, &QueryOptions::default())
    }

    /// Bulk insert of bounded entities.
    pub fn bulk_insert_bounded(&self, items: Vec<(Point3, Aabb, C)>) -> VoxResult<Vec<I>> {
        let rows = items
            .into_iter()
            .map(|(position, bounds, content)| crate::voxtree::bulk::pipeline::BulkRow {
                position,
                bounds: Some(bounds),
                content,
            })
            .collect();
        crate::voxtree::bulk::pipeline::execute(self, rows, &QueryOptions::default())
    }

    /// Bulk insert with mixed bounds and a cancellation/deadline budget.
    pub fn bulk_insert_with_options(
        &self,
        items: Vec<(Point3, Option<Aabb>, C)>,
        options: &QueryOptions,
    ) -> VoxResult<Vec<I>> {
        let rows = items
            .into_iter()
            .map(|(position, bounds, content)| crate::voxtree::bulk::pipeline::BulkRow {
                position,
                bounds,
                content,
            })
            .collect();
        crate::voxtree::bulk::pipeline::execute(self, rows, options)
    }

    // == MAINTENANCE ==

    /// Runs a split/merge/2:1 pass under the writer lease.
    pub fn rebalance(&self) -> VoxResult<RebalanceReport> {
        let mut state = self.write_state();
        let report = crate::voxtree::balance::rebalance(
            &mut state,
            &self.config,
            &self.metrics,
            self.strategy.as_ref(),
        );
        monitor::log(
            LogLevel::NOTICE,
            &format!(
                "rebalance: {} splits, {} merges, {} neighbor splits",
                report.splits, report.merges, report.neighbor_splits
            ),
        );
        Ok(report)
    }
}
