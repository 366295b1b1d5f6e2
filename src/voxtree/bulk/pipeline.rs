// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! The staged bulk-insert implementation.
//!
//! All pre-computation (validation, level selection, cover computation,
//! sorting, partitioning) runs without the store lease; only the merge
//! and the deferred subdivision take the writer section. A cancellation
//! observed before the merge drops the private deltas — nothing is
//! committed.

use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::index::{IndexConfig, SpatialIndex};
use crate::voxtree::key::{cell_extent, grid_coords, SpatialKey};
use crate::voxtree::monitor::{self, LogLevel};
use crate::voxtree::store::{cover_keys, Entity};
use crate::voxtree::voxstream::{
    cancelled, EntityId, QueryClock, QueryOptions, VoxError, VoxResult,
};
use std::collections::{BTreeMap, HashSet};

/// Sample size for adaptive occupancy prediction.
const ADAPTIVE_SAMPLE: usize = 4096;

/// One bulk input row.
pub(crate) struct BulkRow<C> {
    pub position: Point3,
    pub bounds: Option<Aabb>,
    pub content: C,
}

/// Runs the full pipeline. Returned ids match input order.
pub(crate) fn execute<K, I, C>(
    index: &SpatialIndex<K, I, C>,
    rows: Vec<BulkRow<C>>,
    options: &QueryOptions,
) -> VoxResult<Vec<I>>
where
    K: SpatialKey,
    I: EntityId,
    C: Clone + Send + Sync + 'static,
{
    let config = index.config().clone();
    let clock = QueryClock::new(options);

    // Stage 1: validate everything before touching any state.
    for (offset, row) in rows.iter().enumerate() {
        if let Err(err) = row.position.validate() {
            return Err(batch_abort(offset, err));
        }
        if let Some(bounds) = &row.bounds {
            if let Err(err) = bounds.validate() {
                return Err(batch_abort(offset, err));
            }
        }
    }

    // Stage 2: pick the registration level.
    let level = if config.adaptive.enabled {
        adaptive_level(&rows, &config)
    } else {
        config.default_level
    };

    // Ids are drawn in input order so the result aligns with the input.
    let ids: Vec<I> = rows.iter().map(|_| index.id_generator().next_id()).collect();

    // Stage 3: compute covers in parallel (the O(level) TM walks happen
    // here, on the workers, cache-assisted).
    let covers = compute_covers(&rows, level, &config)?;

    // Stage 4: sort (key, ordinal) pairs — this recovers locality.
    let mut pairs: Vec<(K, usize)> = covers
        .iter()
        .enumerate()
        .flat_map(|(ordinal, cover)| cover.iter().map(move |key| (*key, ordinal)))
        .collect();
    pairs.sort_unstable();

    // Stage 5: partition into contiguous key ranges, never splitting a
    // same-key run.
    let threads = config.effective_threads();
    let chunks = partition(&pairs, &config, threads);

    // Stage 6: per-chunk delta maps. Chunks own disjoint key ranges, so
    // the merged map is a plain concatenation.
    let deltas: Vec<BTreeMap<K, Vec<usize>>> = if chunks.len() <= 1 {
        chunks.iter().map(|chunk| delta_of(chunk)).collect()
    } else {
        std::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| scope.spawn(move || delta_of(chunk)))
                .collect();
            handles.into_iter().map(|h| h.join().expect("bulk worker panicked")).collect()
        })
    };

    // A cancellation observed here rolls the private deltas back by
    // dropping them; nothing was committed yet.
    if clock.expired() {
        return Err(cancelled("bulk_insert", 0));
    }

    // Merge under a single writer section, then deferred subdivision.
    let mut state = index.write_state();

    // Conflict check before any mutation keeps the merge all-or-nothing
    // even under a misbehaving id generator.
    let mut fresh: HashSet<&I> = HashSet::new();
    for (offset, id) in ids.iter().enumerate() {
        if state.entities.contains(id) || !fresh.insert(id) {
            return Err(batch_abort(
                offset,
                crate::voxtree::voxstream::conflict(
                    format!("entity {:?}", id),
                    "duplicate id from generator",
                ),
            ));
        }
    }

    let placements: Vec<(Point3, Option<Aabb>)> = rows
        .iter()
        .map(|row| (row.position, row.bounds))
        .collect();
    for (row, id) in rows.into_iter().zip(ids.iter()) {
        let entity = Entity::new(id.clone(), row.position, row.bounds, row.content, level);
        state.entities.insert(entity)?;
    }
    let mut touched: Vec<K> = Vec::new();
    for delta in &deltas {
        for (key, ordinals) in delta {
            for ordinal in ordinals {
                let (position, bounds) = placements[*ordinal];
                let target = crate::voxtree::index::subdivide::sink_key(
                    &state,
                    &config,
                    *key,
                    position,
                    bounds.as_ref(),
                );
                state.nodes.insert_entity(target, ids[*ordinal].clone());
                if let Some(entity) = state.entities.get_mut(&ids[*ordinal]) {
                    entity.add_key(target);
                }
                if !touched.contains(&target) {
                    touched.push(target);
                }
            }
            index.strategy_ref().note_change(key);
        }
    }
    for key in touched {
        crate::voxtree::index::subdivide::maybe_subdivide(
            &mut state,
            &config,
            index.metrics_ref(),
            key,
        );
    }
    drop(state);

    index.metrics_ref().record_bulk(ids.len() as u64);
    monitor::log(
        LogLevel::NOTICE,
        &format!(
            "bulk insert committed {} entities at level {}",
            ids.len(),
            level
        ),
    );
    Ok(ids)
}

fn batch_abort(offset: usize, err: VoxError) -> VoxError {
    VoxError::BatchAborted {
        offset,
        reason: err.to_string(),
    }
}

/// Predicted-occupancy level selection: the coarsest level whose expected
/// per-cell occupancy stays at or below the configured ceiling.
fn adaptive_level<C>(rows: &[BulkRow<C>], config: &IndexConfig) -> u8 {
    if rows.is_empty() {
        return config.default_level;
    }
    let stride = (rows.len() / ADAPTIVE_SAMPLE).max(1);
    let sample: Vec<(u32, u32, u32)> = rows
        .iter()
        .step_by(stride)
        .map(|row| grid_coords(&row.position))
        .collect();
    let scale = rows.len() as f64 / sample.len() as f64;
    let ceiling = config.effective_occupancy_hi();

    let occupancy = |level: u8| -> f64 {
        let h = cell_extent(level);
        let mask = !(h - 1);
        let distinct: HashSet<(u32, u32, u32)> = sample
            .iter()
            .map(|(x, y, z)| (x & mask, y & mask, z & mask))
            .collect();
        (sample.len() as f64 / distinct.len() as f64) * scale
    };

    // Occupancy is non-increasing in the level; binary-search the first
    // level inside the band.
    let (mut lo, mut hi) = (0u8, config.max_depth);
    if occupancy(hi) > ceiling {
        return hi;
    }
    while lo < hi {
        let mid = (lo + hi) / 2;
        if occupancy(mid) <= ceiling {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Stage 3 worker fan-out.
fn compute_covers<K, C>(
    rows: &[BulkRow<C>],
    level: u8,
    config: &IndexConfig,
) -> VoxResult<Vec<Vec<K>>>
where
    K: SpatialKey,
    C: Sync,
{
    let cover_of = |row: &BulkRow<C>| -> VoxResult<Vec<K>> {
        cover_keys(
            &row.position,
            row.bounds.as_ref(),
            level,
            config.spanning,
            config.max_depth,
            config.max_span_cells,
        )
    };

    if rows.is_empty() || rows.len() < config.bulk.parallel_threshold {
        return rows
            .iter()
            .enumerate()
            .map(|(offset, row)| cover_of(row).map_err(|e| batch_abort(offset, e)))
            .collect();
    }

    let threads = config.effective_threads();
    let chunk_size = rows.len().div_ceil(threads);
    let cover_of = &cover_of;
    let results: Vec<VoxResult<Vec<Vec<K>>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = rows
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(offset, row)| {
                            cover_of(row)
                                .map_err(|e| batch_abort(chunk_index * chunk_size + offset, e))
                        })
                        .collect()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("bulk worker panicked"))
            .collect()
    });

    let mut covers = Vec::with_capacity(rows.len());
    for result in results {
        covers.extend(result?);
    }
    Ok(covers)
}

/// Stage 5: contiguous chunks cut at key boundaries.
fn partition<'a, K: SpatialKey>(
    pairs: &'a [(K, usize)],
    config: &IndexConfig,
    threads: usize,
) -> Vec<&'a [(K, usize)]> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let target = (pairs.len() / (threads * 4).max(1)).max(config.bulk.chunk_threshold);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < pairs.len() {
        let mut end = (start + target).min(pairs.len());
        // Extend to the end of the same-key run.
        while end < pairs.len() && pairs[end].0 == pairs[end - 1].0 {
            end += 1;
        }
        chunks.push(&pairs[start..end]);
        start = end;
    }
    chunks
}

/// Stage 6: group a chunk's ordinals by key.
fn delta_of<K: SpatialKey>(chunk: &[(K, usize)]) -> BTreeMap<K, Vec<usize>> {
    let mut delta: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (key, ordinal) in chunk {
        delta.entry(*key).or_default().push(*ordinal);
    }
    delta
}
