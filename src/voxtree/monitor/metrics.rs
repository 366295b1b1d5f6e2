// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Operation metrics storage and aggregation.
//!
//! ## Features
//! - Atomic counters, safe to bump from reader threads
//! - Mutation metrics (inserts, updates, removes, bulk batches)
//! - Query metrics by kind
//! - Balancer metrics (splits, merges)
//!
//! ## Performance
//! - Metric recording: one relaxed atomic add
//! - Snapshot: < 1μs

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-index atomic counters.
#[derive(Debug, Default)]
pub struct IndexMetrics {
    inserts: AtomicU64,
    updates: AtomicU64,
    removes: AtomicU64,
    bulk_batches: AtomicU64,
    bulk_entities: AtomicU64,
    knn_queries: AtomicU64,
    range_queries: AtomicU64,
    ray_queries: AtomicU64,
    plane_queries: AtomicU64,
    frustum_queries: AtomicU64,
    collision_queries: AtomicU64,
    node_splits: AtomicU64,
    node_merges: AtomicU64,
}

/// Aggregated, serialisable view of the counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub updates: u64,
    pub removes: u64,
    pub bulk_batches: u64,
    pub bulk_entities: u64,
    pub knn_queries: u64,
    pub range_queries: u64,
    pub ray_queries: u64,
    pub plane_queries: u64,
    pub frustum_queries: u64,
    pub collision_queries: u64,
    pub node_splits: u64,
    pub node_merges: u64,
    pub tm_cache_hits: u64,
    pub tm_cache_misses: u64,
}

impl IndexMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bulk(&self, entities: u64) {
        self.bulk_batches.fetch_add(1, Ordering::Relaxed);
        self.bulk_entities.fetch_add(entities, Ordering::Relaxed);
    }

    pub fn record_knn(&self) {
        self.knn_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_range(&self) {
        self.range_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ray(&self) {
        self.ray_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plane(&self) {
        self.plane_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frustum(&self) {
        self.frustum_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collision(&self) {
        self.collision_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_split(&self) {
        self.node_splits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge(&self) {
        self.node_merges.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot including the process-wide TM-cache counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        use crate::voxtree::key::tm_cache::TM_CACHE;
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            bulk_batches: self.bulk_batches.load(Ordering::Relaxed),
            bulk_entities: self.bulk_entities.load(Ordering::Relaxed),
            knn_queries: self.knn_queries.load(Ordering::Relaxed),
            range_queries: self.range_queries.load(Ordering::Relaxed),
            ray_queries: self.ray_queries.load(Ordering::Relaxed),
            plane_queries: self.plane_queries.load(Ordering::Relaxed),
            frustum_queries: self.frustum_queries.load(Ordering::Relaxed),
            collision_queries: self.collision_queries.load(Ordering::Relaxed),
            node_splits: self.node_splits.load(Ordering::Relaxed),
            node_merges: self.node_merges.load(Ordering::Relaxed),
            tm_cache_hits: TM_CACHE.hit_count(),
            tm_cache_misses: TM_CACHE.miss_count(),
        }
    }
}
