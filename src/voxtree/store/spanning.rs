// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Spanning policy: which keys a bounded entity registers under.
//!
//! Unbounded entities always occupy the single cell containing their
//! position. Bounded entities register under every overlapping key
//! according to the policy; query results deduplicate by id.

use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::SpatialKey;
use crate::voxtree::voxstream::VoxResult;
use serde::{Deserialize, Serialize};

/// Cover strategy for bounded entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanningPolicy {
    /// Register at the position's cell only.
    #[default]
    None,
    /// Register under every overlapping cell at the chosen level.
    SpanBounds,
    /// As `SpanBounds`, coarsening the level until the cover stays within
    /// the configured cell budget.
    ClampedSpan,
    /// As `SpanBounds`, at the index's deepest configured level.
    ReplicateAtLeaves,
}

/// Computes the cover-set for an entity.
///
/// ## Input
/// - `position`: entity position (already validated)
/// - `bounds`: optional box; absent boxes fall back to the position cell
/// - `level`: requested registration level
/// - `max_depth`: the index's deepest level (ReplicateAtLeaves target)
/// - `max_span_cells`: cover budget for ClampedSpan
///
/// ## Output
/// - Ascending, duplicate-free keys; never empty on success
pub fn cover_keys<K: SpatialKey>(
    position: &Point3,
    bounds: Option<&Aabb>,
    level: u8,
    policy: SpanningPolicy,
    max_depth: u8,
    max_span_cells: usize,
) -> VoxResult<Vec<K>> {
    let bounds = match (policy, bounds) {
        (SpanningPolicy::None, _) | (_, None) => {
            return Ok(vec![K::from_point(position, level)?]);
        }
        (_, Some(b)) => b,
    };

    let mut keys = match policy {
        SpanningPolicy::SpanBounds => K::cover_aabb(bounds, level)?,
        SpanningPolicy::ReplicateAtLeaves => K::cover_aabb(bounds, max_depth)?,
        SpanningPolicy::ClampedSpan => {
            let mut lvl = level;
            let mut cover = K::cover_aabb(bounds, lvl)?;
            while cover.len() > max_span_cells && lvl > 0 {
                lvl -= 1;
                cover = K::cover_aabb(bounds, lvl)?;
            }
            cover
        }
        SpanningPolicy::None => unreachable!("handled above"),
    };
    keys.sort_unstable();
    keys.dedup();
    Ok(keys)
}
